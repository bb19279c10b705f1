//! Matcher - 질문에 가장 잘 맞는 FAQ 응답 선택
//!
//! 1. 가이드 코드 (4자리 숫자) → `guide_code_NNNN` 키워드 정확 일치 (0.95)
//! 2. 키워드 부분 문자열 겹침 × 1.5 + 퍼지 유사도
//! 3. 신뢰도 게이트: 0.15 미만이면 고정 폴백 응답 (0.04)
//!
//! 저장소를 읽기만 하므로 여러 요청에서 동시에 호출해도 안전합니다.

use std::sync::LazyLock;

use regex::Regex;

use super::similarity::similarity_ratio;
use super::store::{KnowledgeRecord, KnowledgeStore};

/// 신뢰할 만한 매칭이 없을 때의 응답
pub const FALLBACK_ANSWER: &str = "I couldn't find an exact match in the knowledge base. \
     Try a different phrasing or ask a supervisor.";

/// 가이드 코드 키워드 접두사
pub const GUIDE_CODE_PREFIX: &str = "guide_code_";

/// 단어 경계로 둘러싸인 4자리 숫자
static GUIDE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9]{4})\b").expect("valid guide code regex"));

// ============================================================================
// Match Configuration
// ============================================================================

/// 매칭 가중치 및 임계값
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// 겹치는 키워드 1개당 가중치
    pub overlap_weight: f64,
    /// 이 점수 미만이면 폴백 응답
    pub confidence_threshold: f64,
    /// 폴백 응답의 고정 신뢰도
    pub fallback_confidence: f64,
    /// 가이드 코드 일치 시 고정 신뢰도
    pub guide_code_confidence: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            overlap_weight: 1.5,
            confidence_threshold: 0.15,
            fallback_confidence: 0.04,
            guide_code_confidence: 0.95,
        }
    }
}

// ============================================================================
// Types
// ============================================================================

/// 응답 결정 경로
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    /// 가이드 코드 정확 일치
    GuideCode,
    /// 키워드 겹침 + 퍼지 점수
    Scored,
    /// 신뢰도 게이트 미달
    Fallback,
}

/// 최종 매칭 결과
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub answer: String,
    pub confidence: f64,
    /// 선택된 레코드 ID (폴백이면 None)
    pub record_id: Option<String>,
    pub method: MatchMethod,
}

/// 게이트 적용 전 최고 점수 후보
#[derive(Debug, Clone, PartialEq)]
pub struct RawMatch<'a> {
    pub record: Option<&'a KnowledgeRecord>,
    pub score: f64,
    pub method: MatchMethod,
}

/// 레코드별 점수 내역
#[derive(Debug, Clone)]
pub struct ScoredRecord<'a> {
    pub record: &'a KnowledgeRecord,
    pub overlap: usize,
    pub fuzzy: f64,
    pub score: f64,
}

// ============================================================================
// Matcher
// ============================================================================

/// FAQ 매처 (상태 없음)
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    config: MatchConfig,
}

impl Matcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// 질문에 대한 응답 (신뢰도 게이트 적용)
    pub fn answer(&self, query: &str, store: &KnowledgeStore) -> MatchResult {
        let raw = self.best_raw(query, store);

        match raw.record {
            Some(record) if raw.score >= self.config.confidence_threshold => {
                tracing::debug!(
                    "Matched record {} via {:?} (score={:.4})",
                    record.id,
                    raw.method,
                    raw.score
                );
                MatchResult {
                    answer: record.answer.clone(),
                    confidence: raw.score,
                    record_id: Some(record.id.clone()),
                    method: raw.method,
                }
            }
            _ => {
                tracing::debug!("Below confidence gate (score={:.4}), using fallback", raw.score);
                MatchResult {
                    answer: FALLBACK_ANSWER.to_string(),
                    confidence: self.config.fallback_confidence,
                    record_id: None,
                    method: MatchMethod::Fallback,
                }
            }
        }
    }

    /// 게이트 적용 전 최고 후보
    ///
    /// 저장소가 비어 있으면 `record: None, score: 0.0`.
    pub fn best_raw<'a>(&self, query: &str, store: &'a KnowledgeStore) -> RawMatch<'a> {
        let normalized = normalize_query(query);

        if let Some(record) = find_guide_code(&normalized, store) {
            return RawMatch {
                record: Some(record),
                score: self.config.guide_code_confidence,
                method: MatchMethod::GuideCode,
            };
        }

        // 동점이면 앞선 레코드 유지 (엄격히 클 때만 교체)
        let mut best: Option<ScoredRecord<'a>> = None;
        for record in store.iter() {
            let scored = self.score_record(&normalized, record);
            if best.as_ref().map_or(true, |b| scored.score > b.score) {
                best = Some(scored);
            }
        }

        match best {
            Some(b) => RawMatch {
                record: Some(b.record),
                score: b.score,
                method: MatchMethod::Scored,
            },
            None => RawMatch {
                record: None,
                score: 0.0,
                method: MatchMethod::Scored,
            },
        }
    }

    /// 전체 레코드 점수 (내림차순, 동점은 저장 순서)
    ///
    /// 가이드 코드 경로는 고려하지 않는 진단용 목록입니다.
    pub fn rank<'a>(
        &self,
        query: &str,
        store: &'a KnowledgeStore,
        limit: usize,
    ) -> Vec<ScoredRecord<'a>> {
        let normalized = normalize_query(query);

        let mut scored: Vec<ScoredRecord<'a>> = store
            .iter()
            .map(|record| self.score_record(&normalized, record))
            .collect();

        // sort_by는 안정 정렬
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);
        scored
    }

    /// 단일 레코드 점수 (query는 정규화된 상태)
    fn score_record<'a>(&self, query: &str, record: &'a KnowledgeRecord) -> ScoredRecord<'a> {
        let overlap = keyword_overlap(query, record);
        let fuzzy = similarity_ratio(query, &record.combined_text());
        let score = overlap as f64 * self.config.overlap_weight + fuzzy;

        ScoredRecord {
            record,
            overlap,
            fuzzy,
            score,
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 질의 정규화 (소문자 + trim)
pub fn normalize_query(query: &str) -> String {
    query.to_lowercase().trim().to_string()
}

/// 질의에서 첫 번째 가이드 코드 추출 (`guide_code_NNNN`)
pub fn extract_guide_code(normalized: &str) -> Option<String> {
    GUIDE_CODE_RE
        .captures(normalized)
        .and_then(|caps| caps.get(1))
        .map(|m| format!("{}{}", GUIDE_CODE_PREFIX, m.as_str()))
}

/// 가이드 코드 키워드를 가진 첫 번째 레코드
fn find_guide_code<'a>(normalized: &str, store: &'a KnowledgeStore) -> Option<&'a KnowledgeRecord> {
    let token = extract_guide_code(normalized)?;
    store.iter().find(|r| r.has_keyword(&token))
}

/// 질의에 부분 문자열로 포함된 키워드 수
///
/// 단어 경계를 보지 않으므로 "cat"은 "category"에도 일치합니다.
pub fn keyword_overlap(normalized: &str, record: &KnowledgeRecord) -> usize {
    record
        .keywords
        .iter()
        .filter(|k| normalized.contains(k.as_str()))
        .count()
}

// ============================================================================
// Tests
// ============================================================================
