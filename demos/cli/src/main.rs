use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use patients_core::{Column, RosterConfig, RosterStatus, RosterView};
use patients_fhir::normalize_bundle_str;

#[derive(Parser, Debug)]
#[command(
    name = "patients-cli",
    about = "In danh sách bệnh nhân từ bundle FHIR JSON, lọc theo khoảng tuổi.",
    allow_negative_numbers = true
)]
struct Args {
    /// Đường dẫn tới file JSON bundle.
    #[arg(short, long)]
    input: PathBuf,

    /// Tuổi nhỏ nhất (bao gồm).
    #[arg(long, default_value_t = 0)]
    min_age: i32,

    /// Tuổi lớn nhất (bao gồm).
    #[arg(long, default_value_t = 100)]
    max_age: i32,

    /// In snapshot dạng JSON thay vì bảng.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let data = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Không đọc được file {:?}", args.input))?;

    let config = RosterConfig::default();
    let view = build_view(&data, &config, args.min_age, args.max_age)
        .with_context(|| format!("Không xử lý được bundle {:?}", args.input))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view.snapshot())?);
    } else {
        print!("{}", render_table(&view, &config));
    }

    Ok(())
}

fn build_view(
    data: &str,
    config: &RosterConfig,
    min_age: i32,
    max_age: i32,
) -> anyhow::Result<RosterView> {
    let rows = normalize_bundle_str(data)?;
    let total = rows.len();

    let mut view = RosterView::new(config);
    view.load(rows);
    view.set_age_range(min_age, max_age)?;

    log::info!(
        "Đã nạp {total} bệnh nhân, khoảng tuổi [{min_age}, {max_age}] hiển thị {}",
        view.visible_rows().count()
    );
    Ok(view)
}

fn render_table(view: &RosterView, config: &RosterConfig) -> String {
    if !matches!(view.status(), RosterStatus::Ready { .. }) {
        return format!("{}\n", config.empty_label);
    }

    let header = Column::ALL.map(Column::label);
    let body: Vec<[&str; 6]> = view
        .visible_rows()
        .map(|row| row.display_cells(&config.placeholder))
        .collect();

    let mut widths = header.map(|label| label.chars().count());
    for cells in &body {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    push_line(&mut out, &rule, &widths);
    for cells in &body {
        push_line(&mut out, cells, &widths);
    }
    out
}

fn push_line<S: AsRef<str>>(out: &mut String, cells: &[S], widths: &[usize; 6]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell.as_ref(), width = *width))
        .collect();
    out.push_str(line.join(" | ").trim_end());
    out.push('\n');
}
