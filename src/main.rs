use clap::Parser;
use fengshui_client::config::{CliConfig, Command};
use fengshui_client::core::{
    Advance, AdvisoryDesk, Phase, ProgressiveOrchestrator, Snapshot, Status,
};
use fengshui_client::domain::model::{
    AuspiciousDay, BasicResult, ChartAdvice, DailyFortune, DirectionAdvice, InterpretiveResult,
    Query,
};
use fengshui_client::domain::ports::AnalysisService;
use fengshui_client::utils::error::Result;
use fengshui_client::utils::logger::{self, LogFormat};
use fengshui_client::RemoteAnalysisClient;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日志
    logger::init(LogFormat::from_flag(config.log_json), config.verbose);

    tracing::info!("Starting fengshui CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = run(config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建议: {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }
}

async fn run(config: CliConfig) -> Result<()> {
    let settings = config.settings()?;
    tracing::info!(
        "Using analysis service at {} (timeout {:?})",
        settings.base_url,
        settings.timeout
    );
    let client = Arc::new(RemoteAnalysisClient::new(&settings)?);

    match config.command {
        Command::Health => {
            let status = client.health_check().await?;
            if status.is_healthy() {
                println!("✅ 服务正常: {}", status.message.as_deref().unwrap_or(&status.status));
            } else {
                println!("⚠️ 服务状态: {}", status.status);
            }
        }
        Command::Analyze(args) => {
            analyze(client, args.into()).await?;
        }
        Command::LegacyAnalyze(args) => {
            let combined = client.request_legacy_analysis(&args.into()).await?;
            print_basic(&combined.basic);
            print_interpretation(&combined.interpretation);
        }
        Command::Direction { direction } => {
            let advice = AdvisoryDesk::new(client).direction_advice(&direction).await;
            print_advice(&direction, &advice);
        }
        Command::Daily { date, birth } => {
            let basic = match birth.into_query()? {
                Some(query) => Some(client.request_basic(&query).await?),
                None => None,
            };
            let fortune = AdvisoryDesk::new(client)
                .daily_fortune(date, basic.as_ref())
                .await;
            print_fortune(&fortune);
        }
        Command::Auspicious {
            start,
            end,
            activity,
        } => {
            let days = client.request_auspicious_days(start, end, activity).await?;
            print_auspicious(&days);
        }
        Command::Consult(args) => {
            let query: Query = args.into();
            let snapshot = analyze(client.clone(), query.clone()).await?;
            match (&snapshot.basic_result, &snapshot.interpretive_result) {
                (Some(basic), Some(interpretation)) => {
                    let advice = client
                        .request_chart_advice(&query, basic, interpretation)
                        .await?;
                    print_chart_advice(&advice);
                }
                _ => println!("\n⚠️ 缺少详细解读，无法生成个人风水建议"),
            }
        }
        Command::Complete(args) => {
            let report = client.request_complete_analysis(&args.into()).await?;
            print_basic(&report.basic);
            print_interpretation(&report.interpretation);
            if let Some(daily) = &report.daily_info {
                print_fortune(&daily.today_fortune);
                print_auspicious(&daily.auspicious_days);
            }
            for (title, section) in [
                ("风水建议", &report.fengshui_advice),
                ("综合报告", &report.final_report),
            ] {
                if let Some(section) = section {
                    println!("\n== {} ==", title);
                    println!(
                        "{}",
                        serde_json::to_string_pretty(section).unwrap_or_else(|_| section.to_string())
                    );
                }
            }
        }
    }

    Ok(())
}

/// Progressive analysis: the chart is printed as soon as it arrives.
async fn analyze(client: Arc<RemoteAnalysisClient>, query: Query) -> Result<Snapshot> {
    let mut orchestrator = ProgressiveOrchestrator::new(client);
    let snapshot = orchestrator.start(query)?;
    render(&snapshot);

    while !orchestrator.snapshot().status.is_settled() {
        match orchestrator.advance().await {
            Some(Advance::Applied(snapshots)) => snapshots.iter().for_each(render),
            Some(Advance::Discarded { .. }) => {}
            None => break,
        }
    }

    let snapshot = orchestrator.snapshot();
    match &snapshot.status {
        Status::Failed {
            phase: Phase::Basic,
            error,
        } => Err(error.clone()),
        _ => Ok(snapshot),
    }
}

fn render(snapshot: &Snapshot) {
    match &snapshot.status {
        Status::Idle => {}
        Status::LoadingBasic => println!("⏳ 正在计算八字..."),
        Status::BasicReady => {
            if let Some(basic) = &snapshot.basic_result {
                print_basic(basic);
            }
        }
        Status::LoadingInterpretation => println!("\n⏳ 正在生成详细解读..."),
        Status::Complete => {
            if let Some(interpretation) = &snapshot.interpretive_result {
                print_interpretation(interpretation);
            }
        }
        Status::Failed {
            phase: Phase::Interpretation,
            error,
        } => {
            // 八字结果仍然有效，只提示解读失败
            println!("\n⚠️ 详细解读暂不可用: {}", error.user_friendly_message());
            println!("💡 {}", error.recovery_suggestion());
        }
        Status::Failed { .. } => {}
    }
}

fn print_basic(basic: &BasicResult) {
    println!("\n== 八字 ==");
    println!("{}", basic.pillars().join(" "));
    println!("生肖: {}  纳音: {}", basic.zodiac, basic.nayin);
    let counts: Vec<String> = basic
        .wuxing
        .entries()
        .iter()
        .map(|(element, count)| format!("{}{}", element, count))
        .collect();
    println!("五行: {}", counts.join(" "));
}

fn print_interpretation(interpretation: &InterpretiveResult) {
    let personality = &interpretation.personality;
    let fortune = &interpretation.fortune;
    let lucky = &interpretation.lucky_elements;

    println!("\n== 解读 ==");
    println!("性格: {}", personality.traits.join("、"));
    println!("优势: {}", personality.strengths.join("、"));
    println!("不足: {}", personality.weaknesses.join("、"));
    println!("事业: {}", fortune.career);
    println!("财运: {}", fortune.wealth);
    println!("健康: {}", fortune.health);
    println!("感情: {}", fortune.relationship);
    println!("幸运颜色: {}", lucky.colors.join("、"));
    let numbers: Vec<String> = lucky.numbers.iter().map(u32::to_string).collect();
    println!("幸运数字: {}", numbers.join("、"));
    println!("幸运方位: {}", lucky.directions.join("、"));
    if let Some(analysis) = &interpretation.wuxing_analysis {
        println!("喜用: {}", analysis.favorable_elements.join("、"));
        println!("忌: {}", analysis.unfavorable_elements.join("、"));
    }
    for advice in &interpretation.life_advice {
        println!("- {}", advice);
    }
    println!("平衡分: {}", interpretation.balance_score);
}

fn print_advice(direction: &str, advice: &DirectionAdvice) {
    println!("== {} ==", direction);
    println!("五行: {}  颜色: {}", advice.element, advice.color);
    println!("利于: {}", advice.beneficial);
    for suggestion in &advice.suggestions {
        println!("- {}", suggestion);
    }
}

fn print_chart_advice(advice: &ChartAdvice) {
    println!("\n== 个人风水建议 ==");
    for (topic, section) in advice.topics() {
        match section.as_str() {
            Some(text) => println!("[{}] {}", topic, text),
            None => println!(
                "[{}]\n{}",
                topic,
                serde_json::to_string_pretty(section).unwrap_or_else(|_| section.to_string())
            ),
        }
    }
}

fn print_fortune(fortune: &DailyFortune) {
    println!("\n== {} {} ==", fortune.date, fortune.ganzhi);
    if fortune.placeholder {
        println!("⚠️ 服务暂不可用，以下为默认参考数据");
    }
    if let Some(lunar) = fortune.lunar_description() {
        println!("农历: {}", lunar);
    }
    println!(
        "综合: {} ({})",
        fortune.overall_score,
        fortune.score_label()
    );
    println!("宜: {}", fortune.suitable.join(" "));
    println!("忌: {}", fortune.unsuitable.join(" "));
    println!("财神方位: {}  冲: {}", fortune.wealth_direction, fortune.conflict_zodiac);
    for (slot, luck) in &fortune.time_fortune {
        println!("{} {}", slot, luck);
    }
    if let Some(personal) = &fortune.personal_fortune {
        println!("个人运势: {} {}", personal.score, personal.description);
        if let Some(advice) = &personal.advice {
            println!("💡 {}", advice);
        }
    }
}

fn print_auspicious(days: &[AuspiciousDay]) {
    if days.is_empty() {
        println!("\n没有找到合适的日子");
        return;
    }
    println!("\n== 吉日 ==");
    for day in days {
        println!(
            "{}  {}分  {}  财神{}",
            day.date, day.score, day.reason, day.wealth_direction
        );
    }
}
