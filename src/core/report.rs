use crate::domain::model::{Document, Label};
use crate::utils::error::{EtlError, Result};
use csv::WriterBuilder;
use serde::Serialize;

const HORSE_HEADERS: [&str; 11] = [
    "race",
    "horse",
    "image",
    "play_game_count",
    "win",
    "lose",
    "course_aptitude",
    "distance_aptitude",
    "running_style",
    "heavy_racetrack",
    "result_count",
];

const RESULT_HEADERS: [&str; 12] = [
    "race",
    "horse",
    "date",
    "race_name",
    "result",
    "distance",
    "meters",
    "surface",
    "baba",
    "wet",
    "time",
    "seconds",
];

#[derive(Serialize)]
struct HorseRow<'a> {
    race: &'a str,
    horse: &'a str,
    image: Option<&'a str>,
    play_game_count: u32,
    win: u32,
    lose: u32,
    course_aptitude: Option<&'static str>,
    distance_aptitude: Option<&'static str>,
    running_style: Option<&'static str>,
    heavy_racetrack: Option<&'static str>,
    result_count: usize,
}

#[derive(Serialize)]
struct ResultRow<'a> {
    race: &'a str,
    horse: &'a str,
    date: String,
    race_name: &'a str,
    result: String,
    distance: &'a str,
    meters: Option<u32>,
    surface: Option<&'static str>,
    baba: &'a str,
    wet: Option<bool>,
    time: Option<&'a str>,
    seconds: Option<f64>,
}

fn label_of<T: Label>(value: Option<T>) -> Option<&'static str> {
    value.map(|v| v.label())
}

fn write_table<R: Serialize>(headers: &[&str], rows: impl IntoIterator<Item = R>) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| EtlError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// 每匹馬一列
pub fn horses_table(document: &Document) -> Result<String> {
    let rows = document.horses().into_iter().map(|(race, horse)| HorseRow {
        race: race.unwrap_or_default(),
        horse: &horse.name,
        image: horse.image.as_deref(),
        play_game_count: horse.play_game_count,
        win: horse.win,
        lose: horse.lose,
        course_aptitude: label_of(horse.course_aptitude),
        distance_aptitude: label_of(horse.distance_aptitude),
        running_style: label_of(horse.running_style),
        heavy_racetrack: label_of(horse.heavy_racetrack),
        result_count: horse.results.len(),
    });
    write_table(&HORSE_HEADERS, rows)
}

/// 每筆過去成績一列，依原始順序
pub fn results_table(document: &Document) -> Result<String> {
    let rows = document.horses().into_iter().flat_map(|(race, horse)| {
        horse.results.iter().map(move |result| ResultRow {
            race: race.unwrap_or_default(),
            horse: &horse.name,
            date: result.race_day().format("%Y-%m-%d").to_string(),
            race_name: &result.race_name,
            result: result.result.to_string(),
            distance: &result.distance,
            meters: result.meters(),
            surface: result.surface().map(|s| s.label()),
            baba: &result.baba,
            wet: result.track_condition().map(|c| c.is_wet()),
            time: result.time.as_deref(),
            seconds: result.elapsed_seconds(),
        })
    });
    write_table(&RESULT_HEADERS, rows)
}
