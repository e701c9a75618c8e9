use keiba_etl::{
    decode, decode_document, decode_optional, decode_str, decode_value, CourseAptitude, Document,
    DocumentKind, EtlError, FinishPosition, Horse, Race, RaceResult, RunningStyle,
};
use keiba_etl::core::report::horses_table;
use serde_json::{json, Value};

fn result_json(i: usize) -> Value {
    json!({
        "date": format!("2022/0{}/1{}", (i % 9) + 1, i % 10),
        "raceName": format!("Race {}", i),
        "result": (i % 12) + 1,
        "distance": "ダ1400",
        "baba": "良",
        "time": "1:27.3"
    })
}

fn horse_json(name: &str, result_count: usize) -> Value {
    let results: Vec<Value> = (0..result_count).map(result_json).collect();
    json!({
        "name": name,
        "play_game_count": result_count,
        "win": 0,
        "lose": result_count,
        "course_aptitude": "ダート",
        "distance_aptitude": "スプリンター",
        "running_style": "逃げ",
        "heavy_racetrack": "苦手",
        "results": results
    })
}

/// 過去成績 N 筆 -> 型別化後同樣 N 筆且順序不變
#[test]
fn test_horse_results_keep_count_and_order() {
    let horse: Horse = decode(&horse_json("ドライスタウト", 7)).unwrap();

    assert_eq!(horse.results.len(), 7);
    for (i, result) in horse.results.iter().enumerate() {
        assert_eq!(result.race_name, format!("Race {}", i));
        assert_eq!(result.result, FinishPosition::Placed((i % 12) as u32 + 1));
    }
    assert_eq!(horse.course_aptitude, Some(CourseAptitude::Dirt));
    assert_eq!(horse.running_style, Some(RunningStyle::Leader));
}

#[test]
fn test_absent_values_pass_through() {
    assert_eq!(decode_optional::<Race>(None).unwrap(), None);
    assert_eq!(decode_optional::<Horse>(Some(&Value::Null)).unwrap(), None);

    let results: Vec<RaceResult> = decode(&Value::Null).unwrap();
    assert!(results.is_empty());

    let mut horse = horse_json("スマイルウィ", 0);
    horse["results"] = Value::Null;
    let horse: Horse = decode(&horse).unwrap();
    assert!(horse.results.is_empty());
}

/// M 頭の馬、各自の成績 -> 每一層都保留結構與順序
#[test]
fn test_race_nesting_preserved() {
    let counts = [3usize, 0, 5, 1];
    let horses: Vec<Value> = counts
        .iter()
        .enumerate()
        .map(|(i, n)| horse_json(&format!("Horse {}", i), *n))
        .collect();
    let value = json!({
        "name": "JBCスプリント",
        "racetrack": "盛岡",
        "distance": "ダ1200m",
        "horses": horses
    });

    let race: Race = decode(&value).unwrap();
    assert_eq!(race.horses.len(), counts.len());
    for (i, (horse, n)) in race.horses.iter().zip(counts).enumerate() {
        assert_eq!(horse.name, format!("Horse {}", i));
        assert_eq!(horse.results.len(), n);
        let names: Vec<String> = horse.results.iter().map(|r| r.race_name.clone()).collect();
        let expected: Vec<String> = (0..n).map(|j| format!("Race {}", j)).collect();
        assert_eq!(names, expected);
    }
    assert_eq!(race.meters(), Some(1200));
}

#[test]
fn test_nested_error_path() {
    let mut value = json!({
        "name": "x",
        "racetrack": "大井",
        "distance": "ダ1200",
        "horses": [horse_json("A", 1), horse_json("B", 2)]
    });
    value["horses"][1]["results"][1]["date"] = json!("yesterday");

    let err = decode::<Race>(&value).unwrap_err();
    assert_eq!(err.field_path(), Some("horses[1].results[1].date"));
    assert!(matches!(err, EtlError::InvalidValue { .. }));
}

#[test]
fn test_wrong_container_type() {
    let mut value = horse_json("A", 0);
    value["results"] = json!({"date": "2022/01/01"});

    let err = decode::<Horse>(&value).unwrap_err();
    assert!(matches!(
        err,
        EtlError::TypeMismatch { ref path, expected: "array", found: "object" } if path == "results"
    ));
}

#[test]
fn test_encoded_text_matches_value() {
    let value = horse_json("レモンポップ", 2);
    let from_value: Horse = decode_value(&value).unwrap();
    let from_string: Horse = decode_value(&Value::String(value.to_string())).unwrap();
    let from_str: Horse = decode_str(&value.to_string()).unwrap();

    assert_eq!(from_value, from_string);
    assert_eq!(from_value, from_str);
}

#[test]
fn test_malformed_text_is_serialization_error() {
    let err = decode_str::<Horse>("{\"name\": \"x\"").unwrap_err();
    assert!(matches!(err, EtlError::SerializationError(_)));
}

#[test]
fn test_legacy_horse_list_document() {
    // 舊版輸出：只有馬的陣列，適性為英文標籤，沒有 results
    let value = json!([
        {
            "name": "A",
            "play_game_count": 5,
            "win": 1,
            "lose": 4,
            "course_aptitude": "turf",
            "distance_aptitude": "styer",
            "running_style": "hold_up_runner",
            "heavy_racetrack": "tokui"
        }
    ]);

    let document = decode_document(&value, DocumentKind::Auto).unwrap();
    let Document::Horses(horses) = &document else {
        panic!("expected a horse list");
    };
    assert_eq!(horses.len(), 1);
    assert_eq!(horses[0].course_aptitude, Some(CourseAptitude::Turf));
    assert!(horses[0].results.is_empty());
    assert_eq!(document.race_count(), 0);

    // 重新輸出時改用日文標籤
    let output = serde_json::to_value(&document).unwrap();
    assert_eq!(output[0]["course_aptitude"], "ターフ");
    assert_eq!(output[0]["distance_aptitude"], "ステイヤー");
    assert_eq!(output[0]["running_style"], "追い込み");
    assert_eq!(output[0]["heavy_racetrack"], "得意");
}

#[test]
fn test_race_list_document() {
    let value = json!([
        { "name": "R1", "racetrack": "川崎", "distance": "ダ1500", "horses": [horse_json("A", 1)] },
        { "name": "R2", "racetrack": "川崎", "distance": "ダ2100", "horses": [] }
    ]);

    let document = decode_document(&value, DocumentKind::Auto).unwrap();
    assert_eq!(document.kind(), DocumentKind::Races);
    assert_eq!(document.race_count(), 2);
    assert_eq!(document.horse_count(), 1);
    assert_eq!(document.result_count(), 1);
}

/// 賽事清單輸出後再以 auto 讀回，種類與內容不變（含空清單）
#[test]
fn test_race_list_output_decodes_back() {
    let value = json!([
        { "name": "R1", "racetrack": "川崎", "distance": "ダ1500", "horses": [horse_json("A", 2)] }
    ]);

    for document in [
        decode_document(&value, DocumentKind::Races).unwrap(),
        decode_document(&json!([]), DocumentKind::Races).unwrap(),
    ] {
        let text = serde_json::to_string_pretty(&document).unwrap();
        let reloaded: Document = decode_str(&text).unwrap();
        assert_eq!(reloaded.kind(), DocumentKind::Races);
        assert_eq!(reloaded, document);
    }

    // 空的馬匹清單仍輸出為陣列
    let horses = decode_document(&json!([]), DocumentKind::Horses).unwrap();
    let text = serde_json::to_string(&horses).unwrap();
    assert_eq!(text, "[]");
    assert_eq!(decode_str::<Document>(&text).unwrap(), horses);
}

/// 多餘的欄位忽略；有圖片時保留並輸出到 horses.csv
#[test]
fn test_horse_image_and_extra_keys() {
    let mut value = horse_json("イグナイター", 1);
    value["image"] = json!("a.png");
    value["extra"] = json!({ "jockey": "笹川翼", "weights": [56, 57] });
    value["results"][0]["extra"] = json!(true);

    let horse: Horse = decode(&value).unwrap();
    assert_eq!(horse.image.as_deref(), Some("a.png"));
    assert_eq!(horse.results.len(), 1);

    let document = Document::Horses(vec![horse]);
    let csv = horses_table(&document).unwrap();
    let row = csv.lines().nth(1).unwrap();
    assert!(row.starts_with(",イグナイター,a.png,1,0,1,"));
}

#[test]
fn test_empty_image_is_absent() {
    let mut value = horse_json("イグナイター", 0);
    value["image"] = json!("");

    let horse: Horse = decode(&value).unwrap();
    assert!(horse.image.is_none());

    let output = serde_json::to_value(&horse).unwrap();
    assert!(output.get("image").is_none());
}
