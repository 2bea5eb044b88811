use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use staywatch_client::HttpPatientService;
use staywatch_core::risk::{gradient_stops, legend, percent_to_scale, scale_to_percent};
use staywatch_core::{
    color_for, CensusController, DashboardConfig, LoadState, LookupController,
    PatientSource, RiskCategory, RiskInput, RiskSample,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "staywatch-cli",
    about = "Tra cứu lượt nằm ICU và hiển thị thang màu nguy cơ."
)]
struct Args {
    /// Gốc URL của dịch vụ dữ liệu bệnh nhân.
    #[arg(long, env = "STAYWATCH_SERVICE_URL", default_value = "http://127.0.0.1:8000")]
    service_url: String,

    /// In trạng thái dạng JSON thay vì văn bản.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tra cứu một bệnh nhân theo stay id.
    Lookup { stay_id: String },
    /// Liệt kê bệnh nhân đang nằm khoa.
    Census {
        /// Mốc thời gian của danh sách.
        #[arg(long)]
        as_of: Option<String>,
    },
    /// In gradient cho một chuỗi giá trị nguy cơ (`true`, `false` hoặc số 0–10).
    Legend { values: Vec<String> },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = DashboardConfig {
        service_url: args.service_url.clone(),
        ..DashboardConfig::default()
    };

    match &args.command {
        Command::Lookup { stay_id } => lookup(config, stay_id, args.json).await,
        Command::Census { as_of } => {
            if let Some(as_of) = as_of {
                config.census_as_of = as_of.clone();
            }
            census(config, args.json).await
        }
        Command::Legend { values } => print_legend(values),
    }
}

fn source(config: DashboardConfig) -> anyhow::Result<Arc<dyn PatientSource>> {
    debug!(service_url = %config.service_url, "khởi tạo client dịch vụ");
    let service = HttpPatientService::new(config).context("Cấu hình dịch vụ không hợp lệ")?;
    Ok(Arc::new(service))
}

async fn lookup(config: DashboardConfig, stay_id: &str, json: bool) -> anyhow::Result<()> {
    let controller = LookupController::new(source(config)?);
    controller.search(stay_id).await;
    let state = controller.state();

    if json {
        println!("{}", serde_json::to_string_pretty(&state.view())?);
        return Ok(());
    }

    match &state {
        LoadState::Success(patient) => {
            println!(
                "Stay id: {}\nPatient: {} ({}, {} years)\nIn: {}\nOut: {}\nLength of stay: {:.1} h",
                patient.stay_id,
                patient.name,
                patient.gender,
                patient.age,
                patient.intime,
                patient.outtime,
                patient.los_hours
            );
            println!(
                "{}: {} [{}]",
                RiskCategory::Readmission.label(),
                patient.will_be_readmitted,
                patient.readmission_color().to_hex()
            );
            match patient.mortality_rate {
                Some(percent) => {
                    let level = percent_to_scale(percent)?;
                    println!(
                        "{}: {:.1}% [{}]",
                        RiskCategory::Mortality.label(),
                        scale_to_percent(level),
                        color_for(level).to_hex()
                    );
                }
                None => println!("{}: --", RiskCategory::Mortality.label()),
            }
            Ok(())
        }
        LoadState::Failed(kind) => bail!("{kind}"),
        LoadState::Idle | LoadState::Loading => bail!("Lookup did not complete"),
    }
}

async fn census(config: DashboardConfig, json: bool) -> anyhow::Result<()> {
    let controller = CensusController::new(source(config)?);
    controller.refresh().await;
    let state = controller.state();

    if json {
        println!("{}", serde_json::to_string_pretty(&state.view())?);
        return Ok(());
    }

    match &state {
        LoadState::Success(patients) => {
            println!("Current patients: {}", patients.len());
            for patient in patients.iter() {
                println!(
                    "{:>10}  {:>10}  {:<40}  {}",
                    patient.stay_id,
                    patient.subject_id,
                    patient.first_care_unit.as_deref().unwrap_or("--"),
                    patient.readmission_color().to_hex()
                );
            }
            Ok(())
        }
        LoadState::Failed(kind) => bail!("{kind}"),
        LoadState::Idle | LoadState::Loading => bail!("Census did not complete"),
    }
}

fn print_legend(values: &[String]) -> anyhow::Result<()> {
    let samples = values
        .iter()
        .map(|raw| {
            parse_risk(raw).map(|value| RiskSample {
                label: RiskCategory::Readmission,
                value,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let gradient = if samples.is_empty() {
        legend()
    } else {
        gradient_stops(&samples)?
    };

    for stop in &gradient.stops {
        println!("{:>6.1}%  {}  {}", stop.offset, stop.color.to_hex(), stop.color);
    }
    if let Some(css) = gradient.to_css("to right") {
        println!("{css}");
    }
    Ok(())
}

fn parse_risk(raw: &str) -> anyhow::Result<RiskInput> {
    match raw.trim() {
        "true" => Ok(RiskInput::Flag(true)),
        "false" => Ok(RiskInput::Flag(false)),
        other => other
            .parse::<f64>()
            .map(RiskInput::Scale)
            .with_context(|| format!("Giá trị nguy cơ không hợp lệ: {other}")),
    }
}
