//! Knowledge 모듈 - FAQ 지식 저장소 및 매칭
//!
//! - Store: CSV에서 한 번 로드되는 불변 레코드 목록
//! - Similarity: 매칭 블록 기반 문자열 유사도
//! - Matcher: 가이드 코드 + 키워드 겹침 + 퍼지 점수, 신뢰도 게이트

mod matcher;
mod similarity;
mod store;

// Re-exports
pub use matcher::{
    extract_guide_code, keyword_overlap, normalize_query, MatchConfig, MatchMethod, MatchResult,
    Matcher, RawMatch, ScoredRecord, FALLBACK_ANSWER, GUIDE_CODE_PREFIX,
};
pub use similarity::{similarity_ratio, MatchBlock, SequenceMatcher};
pub use store::{
    get_data_dir, parse_keywords, KnowledgeRecord, KnowledgeStore, StoreStats, DEFAULT_FILE_NAME,
};
