//! faq-desk - CSV 기반 FAQ 응답 서버
//!
//! 시작 시 지식베이스(CSV)를 메모리에 올리고,
//! 자유 형식 질문에 가장 잘 맞는 응답과 신뢰도를 돌려줍니다.

pub mod cli;
pub mod knowledge;
pub mod server;

// Re-exports
pub use knowledge::{
    KnowledgeRecord, KnowledgeStore, MatchConfig, MatchMethod, MatchResult, Matcher, StoreStats,
    FALLBACK_ANSWER,
};
pub use server::{build_router, AppState};
