//! 문자열 유사도 - 매칭 블록 기반 정규화 비율
//!
//! 두 문자열에서 가장 긴 공통 블록을 재귀적으로 찾아 (Ratcliff/Obershelp)
//! 일치한 문자 수 M으로 `2·M / (|a| + |b|)` 를 계산합니다.
//!
//! ref: https://docs.python.org/3/library/difflib.html#sequencematcher-objects

use std::collections::HashMap;

/// 인기 원소 휴리스틱이 적용되는 최소 길이
const AUTOJUNK_MIN_LEN: usize = 200;

// ============================================================================
// SequenceMatcher
// ============================================================================

/// 매칭 블록 (a 시작, b 시작, 길이)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchBlock {
    pub a: usize,
    pub b: usize,
    pub size: usize,
}

/// 두 문자 시퀀스 간 매칭 블록 계산기
///
/// `b` 쪽 인덱스(문자 → 위치 목록)를 한 번 만들어 두고 재사용합니다.
pub struct SequenceMatcher {
    a: Vec<char>,
    b: Vec<char>,
    b2j: HashMap<char, Vec<usize>>,
}

impl SequenceMatcher {
    /// 새 매처 생성 (인기 원소 휴리스틱 적용)
    pub fn new(a: &str, b: &str) -> Self {
        Self::with_autojunk(a, b, true)
    }

    /// 인기 원소 휴리스틱 여부를 지정하여 생성
    ///
    /// `autojunk`가 켜져 있고 `b`가 200자 이상이면,
    /// `b`에서 `len/100 + 1`회 넘게 나오는 문자는 매칭 시드로 쓰지 않습니다.
    pub fn with_autojunk(a: &str, b: &str, autojunk: bool) -> Self {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();

        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }

        let n = b.len();
        if autojunk && n >= AUTOJUNK_MIN_LEN {
            let ntest = n / 100 + 1;
            b2j.retain(|_, idxs| idxs.len() <= ntest);
        }

        Self { a, b, b2j }
    }

    /// `a[alo..ahi]`, `b[blo..bhi]` 구간에서 가장 긴 공통 블록
    ///
    /// 같은 길이가 여럿이면 a에서 가장 앞, 그중 b에서 가장 앞 블록을 반환합니다.
    fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> MatchBlock {
        let (mut besti, mut bestj, mut bestsize) = (alo, blo, 0usize);

        // j2len[j] = a[i-1]과 b[j]에서 끝나는 공통 블록 길이
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut new_j2len: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let prev = if j > 0 {
                        j2len.get(&(j - 1)).copied().unwrap_or(0)
                    } else {
                        0
                    };
                    let k = prev + 1;
                    new_j2len.insert(j, k);
                    if k > bestsize {
                        besti = i + 1 - k;
                        bestj = j + 1 - k;
                        bestsize = k;
                    }
                }
            }
            j2len = new_j2len;
        }

        // 인기 원소는 시드에서만 빠지므로 양쪽으로 확장 가능
        while besti > alo && bestj > blo && self.a[besti - 1] == self.b[bestj - 1] {
            besti -= 1;
            bestj -= 1;
            bestsize += 1;
        }
        while besti + bestsize < ahi
            && bestj + bestsize < bhi
            && self.a[besti + bestsize] == self.b[bestj + bestsize]
        {
            bestsize += 1;
        }

        MatchBlock {
            a: besti,
            b: bestj,
            size: bestsize,
        }
    }

    /// 모든 매칭 블록 (a 순서로 정렬, 길이 0 블록 제외)
    pub fn matching_blocks(&self) -> Vec<MatchBlock> {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let block = self.find_longest_match(alo, ahi, blo, bhi);
            if block.size == 0 {
                continue;
            }
            if alo < block.a && blo < block.b {
                queue.push((alo, block.a, blo, block.b));
            }
            if block.a + block.size < ahi && block.b + block.size < bhi {
                queue.push((block.a + block.size, ahi, block.b + block.size, bhi));
            }
            blocks.push(block);
        }

        blocks.sort_by_key(|m| (m.a, m.b));
        blocks
    }

    /// 정규화 유사도 (0.0 ~ 1.0)
    pub fn ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        let matches: usize = self.matching_blocks().iter().map(|m| m.size).sum();
        2.0 * matches as f64 / total as f64
    }
}

/// 두 문자열 간 정규화 유사도
///
/// # Arguments
/// * `a` - 질의 문자열
/// * `b` - 비교 대상 (인기 원소 휴리스틱은 이쪽 기준)
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    SequenceMatcher::new(a, b).ratio()
}

// ============================================================================
// Tests
// ============================================================================
