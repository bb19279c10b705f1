//! Knowledge Store - CSV 기반 읽기 전용 FAQ 저장소
//!
//! 프로세스 시작 시 한 번 로드되고, 이후 변경되지 않습니다.
//! 입력 형식: 헤더가 있는 UTF-8 CSV (`id`, `keywords`, `answer`)

use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 기본 지식베이스 파일명
pub const DEFAULT_FILE_NAME: &str = "knowledge.csv";

// ============================================================================
// Data Directory
// ============================================================================

/// 데이터 디렉토리 경로 (~/.faq-desk/)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".faq-desk")
}

// ============================================================================
// Types
// ============================================================================

/// 지식베이스 레코드 (CSV 한 행)
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeRecord {
    /// 식별자 (유일성 검사 없음)
    pub id: String,
    /// 소문자 + trim 된 키워드 (비어 있을 수 있음)
    pub keywords: Vec<String>,
    /// 응답 텍스트
    pub answer: String,
}

impl KnowledgeRecord {
    /// 원시 키워드 문자열로 레코드 생성
    pub fn new(id: impl Into<String>, keywords: &str, answer: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            keywords: parse_keywords(keywords),
            answer: answer.into(),
        }
    }

    /// 키워드를 공백으로 이은 뒤 응답을 붙인 소문자 텍스트 (퍼지 비교 대상)
    pub fn combined_text(&self) -> String {
        format!("{} {}", self.keywords.join(" "), self.answer).to_lowercase()
    }

    /// 정확히 일치하는 키워드 보유 여부
    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }
}

/// CSV 행 (역직렬화용)
#[derive(Debug, Deserialize)]
struct CsvRow {
    id: String,
    #[serde(default)]
    keywords: String,
    #[serde(default)]
    answer: String,
}

/// 저장소 통계
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub record_count: usize,
    pub keyword_count: usize,
    pub records_without_keywords: usize,
    pub duplicate_ids: Vec<String>,
    pub source: Option<PathBuf>,
}

// ============================================================================
// KnowledgeStore
// ============================================================================

/// Knowledge Store - 불변 레코드 목록
///
/// 로드 순서가 그대로 유지되며, 매칭 시 동점 처리 기준이 됩니다.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeStore {
    records: Vec<KnowledgeRecord>,
    source: Option<PathBuf>,
}

impl KnowledgeStore {
    /// CSV 파일에서 로드
    ///
    /// 파일이 없거나 형식이 잘못된 행이 있으면 전체 로드가 실패합니다.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open knowledge file: {}", path.display()))?;

        let mut store = Self::from_reader(file)
            .with_context(|| format!("Failed to load knowledge file: {}", path.display()))?;
        store.source = Some(path.to_path_buf());

        tracing::info!(
            "Loaded {} knowledge records from {}",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    /// 임의의 Reader에서 CSV 파싱
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .context("Failed to read CSV header")?
            .clone();
        if !headers.iter().any(|h| h.trim() == "id") {
            anyhow::bail!("CSV header is missing the 'id' column");
        }

        let mut records = Vec::new();
        for row in csv_reader.deserialize::<CsvRow>() {
            let row = row.map_err(|e| {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                anyhow::anyhow!("Malformed row at line {}: {}", line, e)
            })?;

            records.push(KnowledgeRecord {
                id: row.id,
                keywords: parse_keywords(&row.keywords),
                answer: row.answer,
            });
        }

        Ok(Self::from_records(records))
    }

    /// 메모리 상의 레코드로 생성
    pub fn from_records(records: Vec<KnowledgeRecord>) -> Self {
        let store = Self {
            records,
            source: None,
        };

        for id in store.duplicate_ids() {
            tracing::warn!("Duplicate knowledge id (both records kept): {}", id);
        }

        store
    }

    /// 지식베이스 파일 경로 결정
    ///
    /// 1. 명시적으로 지정된 경로
    /// 2. 현재 디렉토리의 knowledge.csv
    /// 3. ~/.faq-desk/knowledge.csv
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }

        let local = PathBuf::from(DEFAULT_FILE_NAME);
        if local.exists() {
            return local;
        }

        get_data_dir().join(DEFAULT_FILE_NAME)
    }

    pub fn records(&self) -> &[KnowledgeRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &KnowledgeRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 로드한 파일 경로 (메모리 생성 시 None)
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// ID로 첫 번째 레코드 조회
    pub fn get(&self, id: &str) -> Option<&KnowledgeRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// 두 번 이상 나온 ID 목록 (최초 등장 순서)
    pub fn duplicate_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut duplicates = Vec::new();

        for record in &self.records {
            if !seen.insert(record.id.as_str()) && reported.insert(record.id.as_str()) {
                duplicates.push(record.id.clone());
            }
        }

        duplicates
    }

    /// 저장소 통계
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            record_count: self.records.len(),
            keyword_count: self.records.iter().map(|r| r.keywords.len()).sum(),
            records_without_keywords: self
                .records
                .iter()
                .filter(|r| r.keywords.is_empty())
                .count(),
            duplicate_ids: self.duplicate_ids(),
            source: self.source.clone(),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 쉼표 구분 키워드 파싱
///
/// 각 토큰을 trim + 소문자화하고, 빈 토큰은 버립니다.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
