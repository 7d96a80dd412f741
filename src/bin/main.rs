use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use forecast_eval::config::{ConfigLoader, LogConfig, Validator};
use forecast_eval::data_ingestion::{load_modeling_table, TableSchema};
use forecast_eval::evaluation::{RollingEvaluator, TestOutcome};
use forecast_eval::report::ResultReporter;

/// 走訪式樣本外評估：衝突訊號是否改善波動率預測
#[derive(Parser, Debug)]
#[command(name = "forecast_eval", version, about)]
struct Args {
    /// 建模表 CSV 路徑（上游特徵管線的輸出）
    #[arg(long)]
    input: PathBuf,

    /// 商品名稱，決定訊號家族映射
    #[arg(long)]
    commodity: String,

    /// 配置文件路徑；缺省時按 FORECAST_ENV 環境載入
    #[arg(long)]
    config: Option<PathBuf>,

    /// 輸出目錄
    #[arg(long, default_value = "results")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化配置
    let app_config = ConfigLoader::load_application(args.config.as_deref())
        .map_err(|e| anyhow!("配置載入失敗: {}", e))?;
    app_config
        .validate()
        .map_err(|e| anyhow!("配置驗證失敗: {}", e))?;

    // 初始化日誌系統
    init_logging(&app_config.log)?;

    info!(
        input = %args.input.display(),
        commodity = %args.commodity,
        "走訪式樣本外評估開始"
    );

    let schema = TableSchema::default();
    let table = load_modeling_table(&args.input, &args.commodity, &schema)?;

    let evaluator = RollingEvaluator::new(
        app_config.evaluation,
        app_config.forest,
        app_config.selection,
    );
    let outcome = evaluator.evaluate(&table, &schema)?;

    // 品質檢查摘要
    let summary = &outcome.summary;
    info!(
        forecasts_stored = summary.forecasts_stored,
        common_sample = summary.common_sample_size,
        baseline_failures = summary.failures.baseline,
        augmented_failures = summary.failures.augmented,
        benchmark_failures = summary.failures.benchmark,
        "品質檢查"
    );

    if let Some(scores) = &summary.qlike {
        for (model, score) in scores.ranking() {
            info!(model, qlike = score, "共同樣本平均 QLIKE");
        }
    }
    report_test(&summary.dm_baseline_vs_augmented, "baseline vs augmented");
    report_test(&summary.dm_baseline_vs_benchmark, "baseline vs benchmark");

    let reporter = ResultReporter::new(&args.output);
    let (forecasts_path, summary_path) = reporter.write(&outcome)?;
    info!(
        forecasts = %forecasts_path.display(),
        summary = %summary_path.display(),
        "評估完成"
    );

    Ok(())
}

fn report_test(outcome: &TestOutcome, pair: &str) {
    match outcome {
        TestOutcome::Available { stat, p_value, .. } => info!(
            pair,
            stat = stat,
            p_value = p_value,
            "Diebold-Mariano 檢定"
        ),
        TestOutcome::NotAvailable { reason } => {
            info!(pair, reason = %reason, "Diebold-Mariano 檢定不可用")
        }
    }
}

// 初始化日誌系統
fn init_logging(log_config: &LogConfig) -> Result<()> {
    let level = match log_config.level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO, // 默認為INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_max_level(level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("設置日誌系統失敗: {}", e))?;

    Ok(())
}
