//! CLI 모듈
//!
//! faq-desk CLI 명령어 정의 및 구현

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::knowledge::{get_data_dir, KnowledgeRecord, KnowledgeStore, MatchMethod, Matcher};
use crate::server::{self, AppState, DEFAULT_HOST, DEFAULT_PORT};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "faq-desk")]
#[command(version, about = "CSV 기반 FAQ 응답 서버", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// HTTP 서버 실행
    Serve {
        /// 지식베이스 CSV 경로
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// 바인드 호스트
        #[arg(long, default_value = DEFAULT_HOST)]
        host: String,

        /// 바인드 포트
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// 질문 한 건에 응답 (서버 없이)
    Ask {
        /// 질문
        question: String,

        /// 지식베이스 CSV 경로
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// 레코드별 점수 내역 출력
        #[arg(short, long)]
        explain: bool,

        /// 점수 내역 개수 제한
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// 레코드 목록
    List {
        /// 지식베이스 CSV 경로
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// 이 ID의 레코드만 출력 (중복 시 첫 번째)
        #[arg(short, long)]
        id: Option<String>,
    },

    /// 상태 확인
    Status {
        /// 지식베이스 CSV 경로
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve { data, host, port } => cmd_serve(data, &host, port).await,
        Commands::Ask {
            question,
            data,
            explain,
            limit,
        } => cmd_ask(&question, data, explain, limit),
        Commands::List { data, id } => cmd_list(data, id.as_deref()),
        Commands::Status { data } => cmd_status(data),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 지식베이스 로드 (실패 시 시작 중단)
fn load_store(data: Option<PathBuf>) -> Result<KnowledgeStore> {
    let path = KnowledgeStore::resolve_path(data.as_deref());
    KnowledgeStore::load(&path).context("KnowledgeStore 로드 실패")
}

/// 서버 명령어 (serve)
async fn cmd_serve(data: Option<PathBuf>, host: &str, port: u16) -> Result<()> {
    let store = load_store(data)?;

    let stats = store.stats();
    if stats.records_without_keywords > 0 {
        tracing::info!(
            "{} record(s) have no keywords (fuzzy match only)",
            stats.records_without_keywords
        );
    }

    let state = AppState::new(store, Matcher::default());
    server::start(state, host, port).await
}

/// 질문 명령어 (ask)
fn cmd_ask(question: &str, data: Option<PathBuf>, explain: bool, limit: usize) -> Result<()> {
    if question.trim().is_empty() {
        anyhow::bail!("질문이 비어 있습니다");
    }

    let store = load_store(data)?;
    let matcher = Matcher::default();

    let result = matcher.answer(question, &store);

    let method_str = match result.method {
        MatchMethod::GuideCode => "CODE",
        MatchMethod::Scored => "SCORE",
        MatchMethod::Fallback => "FALLBACK",
    };

    println!(
        "[{}] [신뢰도: {:.4}] {}",
        method_str,
        result.confidence,
        result.record_id.as_deref().unwrap_or("-")
    );
    println!("{}", result.answer);

    if explain {
        println!("\n[*] 점수 내역 (상위 {} 건):\n", limit);

        for (i, scored) in matcher.rank(question, &store, limit).iter().enumerate() {
            println!(
                "{}. #{} [점수: {:.4}] 겹침={} 퍼지={:.4}",
                i + 1,
                scored.record.id,
                scored.score,
                scored.overlap,
                scored.fuzzy
            );
            println!("   {}", truncate_text(&scored.record.answer, 80));
        }
    }

    Ok(())
}

/// 목록 명령어 (list)
///
/// `id`가 주어지면 해당 레코드 하나만 출력합니다.
fn cmd_list(data: Option<PathBuf>, id: Option<&str>) -> Result<()> {
    let store = load_store(data)?;

    if let Some(id) = id {
        let record = store
            .get(id)
            .ok_or_else(|| anyhow::anyhow!("ID '{}'인 레코드를 찾을 수 없습니다", id))?;
        print_record(record);
        return Ok(());
    }

    if store.is_empty() {
        println!("[!] 저장된 레코드가 없습니다.");
        return Ok(());
    }

    println!("[OK] 레코드 ({} 건):\n", store.len());

    for record in store.iter() {
        print_record(record);
    }

    Ok(())
}

/// 상태 명령어 (status)
fn cmd_status(data: Option<PathBuf>) -> Result<()> {
    println!("faq-desk v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("[*] 데이터 디렉토리: {}", get_data_dir().display());

    let path = KnowledgeStore::resolve_path(data.as_deref());
    println!("[*] 지식베이스: {}", path.display());

    if let Some(size) = file_size(&path) {
        println!("     크기: {}", format_bytes(size));
    }

    match KnowledgeStore::load(&path) {
        Ok(store) => {
            let stats = store.stats();
            println!("[OK] 레코드: {} 건", stats.record_count);
            println!("     키워드: {} 개", stats.keyword_count);
            if stats.records_without_keywords > 0 {
                println!("     키워드 없음: {} 건", stats.records_without_keywords);
            }
            if !stats.duplicate_ids.is_empty() {
                println!("[!] 중복 ID: {}", stats.duplicate_ids.join(", "));
            }
        }
        Err(e) => {
            println!("[!] 지식베이스 로드 실패: {:#}", e);
        }
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path).ok().map(|m| m.len())
}

fn print_record(record: &KnowledgeRecord) {
    let keywords = if record.keywords.is_empty() {
        "-".to_string()
    } else {
        record.keywords.join(", ")
    };

    println!("  #{:<6} [{}]", record.id, truncate_text(&keywords, 60));
    println!("          {}", truncate_text(&record.answer, 70));
}

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// 바이트 크기 포맷팅
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["faq-desk", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { data, host, port } => {
                assert!(data.is_none());
                assert_eq!(host, DEFAULT_HOST);
                assert_eq!(port, DEFAULT_PORT);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from([
            "faq-desk", "ask", "reset password", "--data", "kb.csv", "--explain",
        ])
        .unwrap();
        match cli.command {
            Commands::Ask {
                question,
                data,
                explain,
                limit,
            } => {
                assert_eq!(question, "reset password");
                assert_eq!(data, Some(PathBuf::from("kb.csv")));
                assert!(explain);
                assert_eq!(limit, 5);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_load_store_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let result = load_store(Some(dir.path().join("missing.csv")));
        assert!(result.is_err());
    }

    #[test]
    fn test_cmd_ask_with_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kb.csv");
        std::fs::write(&path, "id,keywords,answer\n1,wifi,Restart the router.\n").unwrap();

        assert!(cmd_ask("wifi down", Some(path.clone()), true, 3).is_ok());
        assert!(cmd_ask("   ", Some(path), false, 3).is_err());
    }

    #[test]
    fn test_cmd_list_by_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kb.csv");
        std::fs::write(
            &path,
            "id,keywords,answer\n1,wifi,Restart the router.\n1,vpn,Install the client.\n",
        )
        .unwrap();

        assert!(cmd_list(Some(path.clone()), None).is_ok());
        assert!(cmd_list(Some(path.clone()), Some("1")).is_ok());
        assert!(cmd_list(Some(path), Some("missing")).is_err());
    }

    #[test]
    fn test_parse_list_id() {
        let cli = Cli::try_parse_from(["faq-desk", "list", "--id", "7"]).unwrap();
        match cli.command {
            Commands::List { data, id } => {
                assert!(data.is_none());
                assert_eq!(id.as_deref(), Some("7"));
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 5), "hello...");
        assert_eq!(truncate_text("hello\nworld", 20), "hello world");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5120.00 MB");
    }

    #[test]
    fn test_truncate_unicode() {
        let korean = "안녕하세요 세계";
        let truncated = truncate_text(korean, 5);
        assert_eq!(truncated, "안녕하세요...");
    }
}
