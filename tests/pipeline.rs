use std::io::Write;

use booking_dashboard::config::PipelineConfig;
use booking_dashboard::data::filter::FilterDimension;
use booking_dashboard::data::loader;
use booking_dashboard::data::model::Value;
use booking_dashboard::export;
use booking_dashboard::report::Summary;
use booking_dashboard::session::Session;
use pretty_assertions::assert_eq;

const BOOKINGS: &str = "\
hotel,lead_time,arrival_date_month,country,customer_type,adr,agent
Resort Hotel,342,July,PRT,Transient,0,
Resort Hotel,737,July,PRT,Transient,0,
City Hotel,7,July,GBR,Transient,75,304
City Hotel,13,August,GBR,Transient,75,240
Resort Hotel,14,August,GBR,Transient-Party,98,240
City Hotel,0,January,PRT,Contract,107.5,
City Hotel,9,March,FRA,Transient,103.1234567891,9
";

fn load() -> Session {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(BOOKINGS.as_bytes()).unwrap();
    let table = loader::load_file(file.path()).unwrap();
    Session::new(table, PipelineConfig::default()).unwrap()
}

#[test]
fn filter_summarize_export_round_trip() {
    let mut session = load();
    session.select_none(FilterDimension::Country).unwrap();
    session.toggle(FilterDimension::Country, "GBR").unwrap();
    session.toggle(FilterDimension::Country, "FRA").unwrap();

    let report = session.summary().report().unwrap().clone();
    assert_eq!(report.rows, 4);

    let months: Vec<(&str, usize)> = report
        .month_counts
        .iter()
        .filter(|c| c.count > 0)
        .map(|c| (c.label.as_str(), c.count))
        .collect();
    assert_eq!(months, vec![("March", 1), ("July", 1), ("August", 2)]);
    assert_eq!(report.month_counts.len(), 12);

    let bytes = session.export(true).unwrap();
    let back = export::read_data_sheet(&bytes).unwrap();
    let filtered = session.filtered().unwrap().to_table();

    assert_eq!(back.len(), filtered.len());
    assert_eq!(back.schema().len(), filtered.schema().len());
    for (expected, actual) in filtered.rows().iter().zip(back.rows()) {
        for (x, y) in expected.iter().zip(actual) {
            match (x, y) {
                (Value::Text(a), Value::Text(b)) => assert_eq!(a, b),
                _ => match (x.as_f64(), y.as_f64()) {
                    (Some(a), Some(b)) => assert!((a - b).abs() < 1e-9, "{a} != {b}"),
                    _ => assert_eq!(x, y),
                },
            }
        }
    }
}

#[test]
fn empty_filter_short_circuits_and_exports_header() {
    let mut session = load();
    session.select_none(FilterDimension::Month).unwrap();
    assert_eq!(session.summary(), &Summary::Empty);

    let back = export::read_data_sheet(&session.export(true).unwrap()).unwrap();
    assert_eq!(back.len(), 0);
    assert_eq!(
        back.schema().names().collect::<Vec<_>>(),
        vec!["hotel", "lead_time", "arrival_date_month", "country", "customer_type", "adr", "agent"]
    );
}

#[test]
fn statistics_cover_every_numeric_column() {
    let session = load();
    let report = session.summary().report().unwrap();
    let stats = report.statistics.as_ref().unwrap();

    let names: Vec<&str> = stats.iter().map(|s| s.column.as_str()).collect();
    assert_eq!(names, vec!["lead_time", "adr", "agent"]);

    // Missing agents are skipped, not counted as zero.
    let agent = &stats[2];
    assert_eq!(agent.count, 4);
    assert_eq!(agent.mode, Some(240.0));

    let correlation = report.correlation.as_ref().unwrap();
    for i in 0..correlation.len() {
        assert_eq!(correlation.get(i, i), Some(1.0));
    }
}
