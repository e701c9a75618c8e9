use crate::core::decode::{
    decode_str, invalid_value, type_mismatch, Decode, Entity, FieldPath, ObjectReader,
};
use crate::domain::model::{
    CourseAptitude, DistanceAptitude, Document, DocumentKind, FinishPosition, HeavyTrackAptitude,
    Horse, Race, RaceResult, RunningStyle, JST_OFFSET_SECONDS, RACES_KEY,
};
use crate::utils::error::Result;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use serde_json::Value;

/// 成績表的日期沒有時區，一律視為日本時間
const DATE_FORMATS: [&str; 2] = ["%Y/%m/%d", "%Y-%m-%d"];

fn parse_date(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date);
    }

    let jst = FixedOffset::east_opt(JST_OFFSET_SECONDS)?;
    DATE_FORMATS.iter().find_map(|format| {
        let date = NaiveDate::parse_from_str(text, format).ok()?;
        jst.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).single()
    })
}

impl Decode for DateTime<FixedOffset> {
    fn decode(value: &Value, path: &FieldPath) -> Result<Self> {
        match value {
            Value::String(text) => parse_date(text).ok_or_else(|| {
                invalid_value(path, text, "expected RFC 3339 or YYYY/MM/DD date")
            }),
            other => Err(type_mismatch(path, "date string", other)),
        }
    }
}

impl Decode for FinishPosition {
    fn decode(value: &Value, path: &FieldPath) -> Result<Self> {
        let position = match value {
            Value::Number(n) => n.as_i64().and_then(FinishPosition::from_raw),
            Value::String(s) => FinishPosition::from_label(s),
            other => return Err(type_mismatch(path, "integer", other)),
        };
        position.ok_or_else(|| {
            invalid_value(path, value, "expected a position of 1 or more, or -1 for excluded")
        })
    }
}

impl Decode for RaceResult {
    fn decode(value: &Value, path: &FieldPath) -> Result<Self> {
        let reader = ObjectReader::new(value, path)?;
        Ok(RaceResult {
            date: reader.required("date")?,
            race_name: reader.required("raceName")?,
            result: reader.required("result")?,
            distance: reader.required("distance")?,
            baba: reader.required("baba")?,
            time: reader
                .optional::<String>("time")?
                .filter(|time| !time.trim().is_empty()),
        })
    }
}

impl Decode for Horse {
    fn decode(value: &Value, path: &FieldPath) -> Result<Self> {
        let reader = ObjectReader::new(value, path)?;

        let name: String = reader.required("name")?;
        if name.trim().is_empty() {
            return Err(invalid_value(
                &reader.path().key("name"),
                &name,
                "horse name must not be empty",
            ));
        }

        Ok(Horse {
            name,
            image: reader
                .optional::<String>("image")?
                .filter(|image| !image.is_empty()),
            play_game_count: reader.required("play_game_count")?,
            win: reader.required("win")?,
            lose: reader.required("lose")?,
            course_aptitude: reader.label::<CourseAptitude>("course_aptitude")?,
            distance_aptitude: reader.label::<DistanceAptitude>("distance_aptitude")?,
            running_style: reader.label::<RunningStyle>("running_style")?,
            heavy_racetrack: reader.label::<HeavyTrackAptitude>("heavy_racetrack")?,
            results: reader.sequence("results")?,
        })
    }
}

impl Decode for Race {
    fn decode(value: &Value, path: &FieldPath) -> Result<Self> {
        let reader = ObjectReader::new(value, path)?;
        Ok(Race {
            name: reader.required("name")?,
            racetrack: reader.required("racetrack")?,
            distance: reader.required("distance")?,
            horses: reader.sequence("horses")?,
        })
    }
}

impl Entity for RaceResult {
    const NAME: &'static str = "race result";
}

impl Entity for Horse {
    const NAME: &'static str = "horse";
}

impl Entity for Race {
    const NAME: &'static str = "race";
}

/// 依內容推斷文件種類
pub fn detect_kind(value: &Value) -> DocumentKind {
    match value {
        Value::Array(items) => {
            let is_race = items
                .first()
                .and_then(Value::as_object)
                .is_some_and(|first| first.contains_key("horses"));
            if is_race {
                DocumentKind::Races
            } else {
                DocumentKind::Horses
            }
        }
        Value::Object(map) if map.contains_key(RACES_KEY) && !map.contains_key("horses") => {
            DocumentKind::Races
        }
        _ => DocumentKind::Race,
    }
}

/// 賽事清單可為陣列，或本工具輸出的 `{"races": [...]}`
fn decode_races(value: &Value, path: &FieldPath) -> Result<Vec<Race>> {
    if value.is_object() {
        let reader = ObjectReader::new(value, path)?;
        if reader.contains(RACES_KEY) {
            return reader.sequence(RACES_KEY);
        }
    }
    Vec::<Race>::decode(value, path)
}

pub fn decode_document(value: &Value, kind: DocumentKind) -> Result<Document> {
    if let Value::String(text) = value {
        let parsed: Value = decode_str(text)?;
        return decode_document(&parsed, kind);
    }

    let kind = match kind {
        DocumentKind::Auto => detect_kind(value),
        explicit => explicit,
    };

    let root = FieldPath::root();
    let document = match kind {
        DocumentKind::Race | DocumentKind::Auto => Document::Race(Race::decode(value, &root)?),
        DocumentKind::Races => Document::Races(decode_races(value, &root)?),
        DocumentKind::Horses => Document::Horses(Vec::<Horse>::decode(value, &root)?),
    };
    Ok(document)
}

impl Decode for Document {
    fn decode(value: &Value, _path: &FieldPath) -> Result<Self> {
        decode_document(value, DocumentKind::Auto)
    }
}

impl Entity for Document {
    const NAME: &'static str = "document";
}
