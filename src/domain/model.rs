use chrono::{DateTime, FixedOffset, NaiveDate};
use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::OnceLock;

/// 具有固定標籤集合的分類欄位（適性、腳質等）
pub trait Label: Sized + Copy {
    /// 錯誤訊息中使用的名稱
    const KIND: &'static str;

    fn from_label(label: &str) -> Option<Self>;

    fn label(&self) -> &'static str;
}

macro_rules! label_serialize {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_str(self.label())
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.label())
                }
            }
        )+
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CourseAptitude {
    Turf,
    Dirt,
}

impl Label for CourseAptitude {
    const KIND: &'static str = "course aptitude";

    fn from_label(label: &str) -> Option<Self> {
        match label {
            "ターフ" | "turf" => Some(Self::Turf),
            "ダート" | "dirt" => Some(Self::Dirt),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Turf => "ターフ",
            Self::Dirt => "ダート",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistanceAptitude {
    Sprinter,
    Stayer,
}

impl Label for DistanceAptitude {
    const KIND: &'static str = "distance aptitude";

    fn from_label(label: &str) -> Option<Self> {
        match label {
            "スプリンター" | "sprint" | "sprinter" => Some(Self::Sprinter),
            // "styer" 是舊版輸出的拼法
            "ステイヤー" | "styer" | "stayer" => Some(Self::Stayer),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Sprinter => "スプリンター",
            Self::Stayer => "ステイヤー",
        }
    }
}

/// 脚質
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunningStyle {
    /// 逃げ
    Leader,
    /// 先行
    Stalker,
    /// 差し
    Closer,
    /// 追い込み
    DeepCloser,
}

impl Label for RunningStyle {
    const KIND: &'static str = "running style";

    fn from_label(label: &str) -> Option<Self> {
        match label {
            "逃げ" | "front_runner" => Some(Self::Leader),
            "先行" => Some(Self::Stalker),
            "差し" => Some(Self::Closer),
            "追い込み" | "hold_up_runner" => Some(Self::DeepCloser),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Leader => "逃げ",
            Self::Stalker => "先行",
            Self::Closer => "差し",
            Self::DeepCloser => "追い込み",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeavyTrackAptitude {
    Good,
    Poor,
}

impl Label for HeavyTrackAptitude {
    const KIND: &'static str = "heavy track aptitude";

    fn from_label(label: &str) -> Option<Self> {
        match label {
            "得意" | "tokui" => Some(Self::Good),
            "苦手" | "nigate" => Some(Self::Poor),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Good => "得意",
            Self::Poor => "苦手",
        }
    }
}

label_serialize!(CourseAptitude, DistanceAptitude, RunningStyle, HeavyTrackAptitude);

/// 馬場狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackCondition {
    /// 良
    Firm,
    /// 稍重
    GoodToSoft,
    /// 重
    Yielding,
    /// 不良
    Heavy,
}

impl TrackCondition {
    pub fn parse(baba: &str) -> Option<Self> {
        match baba.trim() {
            "良" => Some(Self::Firm),
            "稍重" | "稍" => Some(Self::GoodToSoft),
            "重" => Some(Self::Yielding),
            "不良" | "不" => Some(Self::Heavy),
            _ => None,
        }
    }

    pub fn is_wet(&self) -> bool {
        !matches!(self, Self::Firm)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    Turf,
    Dirt,
    Steeplechase,
}

impl Surface {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Turf => "芝",
            Self::Dirt => "ダ",
            Self::Steeplechase => "障",
        }
    }
}

fn meters_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]+").unwrap())
}

fn elapsed_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:(\d+):)?(\d{1,2})\.(\d)$").unwrap())
}

/// 距離字串（例如 `ダ1400`、`芝1600m`）中的公尺數
pub fn distance_meters(distance: &str) -> Option<u32> {
    meters_regex()
        .find(distance)
        .and_then(|m| m.as_str().parse().ok())
}

pub fn distance_surface(distance: &str) -> Option<Surface> {
    match distance.trim().chars().next()? {
        '芝' => Some(Surface::Turf),
        'ダ' => Some(Surface::Dirt),
        '障' => Some(Surface::Steeplechase),
        _ => None,
    }
}

/// 著順。`-1` 在傳輸格式中代表「除」（除外）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinishPosition {
    Placed(u32),
    Excluded,
}

impl FinishPosition {
    pub const EXCLUDED_RAW: i64 = -1;
    pub const EXCLUDED_LABEL: &'static str = "除";

    pub fn from_raw(raw: i64) -> Option<Self> {
        if raw == Self::EXCLUDED_RAW {
            return Some(Self::Excluded);
        }
        u32::try_from(raw)
            .ok()
            .filter(|n| *n >= 1)
            .map(Self::Placed)
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label == Self::EXCLUDED_LABEL {
            return Some(Self::Excluded);
        }
        label.parse::<i64>().ok().and_then(Self::from_raw)
    }

    pub fn raw(&self) -> i64 {
        match self {
            Self::Placed(n) => i64::from(*n),
            Self::Excluded => Self::EXCLUDED_RAW,
        }
    }

    pub fn is_win(&self) -> bool {
        matches!(self, Self::Placed(1))
    }
}

impl Serialize for FinishPosition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.raw())
    }
}

impl fmt::Display for FinishPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Placed(n) => write!(f, "{}", n),
            Self::Excluded => f.write_str(Self::EXCLUDED_LABEL),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceResult {
    pub date: DateTime<FixedOffset>,
    #[serde(rename = "raceName")]
    pub race_name: String,
    pub result: FinishPosition,
    pub distance: String,
    pub baba: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

/// 日本時間 (+09:00)
pub const JST_OFFSET_SECONDS: i32 = 9 * 3600;

impl RaceResult {
    /// 以日本時間計算的開催日，不受輸入時區影響
    pub fn race_day(&self) -> NaiveDate {
        match FixedOffset::east_opt(JST_OFFSET_SECONDS) {
            Some(jst) => self.date.with_timezone(&jst).date_naive(),
            None => self.date.date_naive(),
        }
    }

    pub fn meters(&self) -> Option<u32> {
        distance_meters(&self.distance)
    }

    pub fn surface(&self) -> Option<Surface> {
        distance_surface(&self.distance)
    }

    pub fn track_condition(&self) -> Option<TrackCondition> {
        TrackCondition::parse(&self.baba)
    }

    /// 走破タイム換算成秒數，例如 `1:27.3` -> 87.3
    pub fn elapsed_seconds(&self) -> Option<f64> {
        let time = self.time.as_deref()?.trim();
        let caps = elapsed_regex().captures(time)?;
        let minutes: f64 = caps
            .get(1)
            .map(|m| m.as_str().parse().ok())
            .unwrap_or(Some(0.0))?;
        let seconds: f64 = caps[2].parse().ok()?;
        let tenths: f64 = caps[3].parse().ok()?;
        Some(minutes * 60.0 + seconds + tenths / 10.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Horse {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub play_game_count: u32,
    pub win: u32,
    pub lose: u32,
    pub course_aptitude: Option<CourseAptitude>,
    pub distance_aptitude: Option<DistanceAptitude>,
    pub running_style: Option<RunningStyle>,
    pub heavy_racetrack: Option<HeavyTrackAptitude>,
    pub results: Vec<RaceResult>,
}

impl Horse {
    /// 欄位之間不一致的地方。解碼時不檢查，只供記錄警告
    pub fn inconsistencies(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.win > self.play_game_count {
            issues.push(format!(
                "win ({}) exceeds play_game_count ({})",
                self.win, self.play_game_count
            ));
        }

        let decided = u64::from(self.win) + u64::from(self.lose);
        if decided != u64::from(self.play_game_count) {
            issues.push(format!(
                "win + lose ({}) differs from play_game_count ({})",
                decided, self.play_game_count
            ));
        }

        if self.results.len() > self.play_game_count as usize {
            issues.push(format!(
                "{} results listed for {} starts",
                self.results.len(),
                self.play_game_count
            ));
        }

        let listed_wins = self.results.iter().filter(|r| r.result.is_win()).count();
        if listed_wins > self.win as usize {
            issues.push(format!(
                "{} wins listed in results but win is {}",
                listed_wins, self.win
            ));
        }

        issues
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Race {
    pub name: String,
    pub racetrack: String,
    pub distance: String,
    pub horses: Vec<Horse>,
}

impl Race {
    pub fn meters(&self) -> Option<u32> {
        distance_meters(&self.distance)
    }

    pub fn surface(&self) -> Option<Surface> {
        distance_surface(&self.distance)
    }
}

/// 一次處理的頂層資料
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Race(Race),
    Races(Vec<Race>),
    Horses(Vec<Horse>),
}

/// 賽事清單輸出時包在 `races` 之下，空清單才不會與馬匹清單混淆
pub const RACES_KEY: &str = "races";

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Document::Race(race) => race.serialize(serializer),
            Document::Races(races) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(RACES_KEY, races)?;
                map.end()
            }
            Document::Horses(horses) => horses.serialize(serializer),
        }
    }
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::Race(_) => DocumentKind::Race,
            Document::Races(_) => DocumentKind::Races,
            Document::Horses(_) => DocumentKind::Horses,
        }
    }

    /// 每匹馬與其所屬賽事名稱（出走表外的馬為 `None`）
    pub fn horses(&self) -> Vec<(Option<&str>, &Horse)> {
        match self {
            Document::Race(race) => race
                .horses
                .iter()
                .map(|h| (Some(race.name.as_str()), h))
                .collect(),
            Document::Races(races) => races
                .iter()
                .flat_map(|race| race.horses.iter().map(move |h| (Some(race.name.as_str()), h)))
                .collect(),
            Document::Horses(horses) => horses.iter().map(|h| (None, h)).collect(),
        }
    }

    pub fn race_count(&self) -> usize {
        match self {
            Document::Race(_) => 1,
            Document::Races(races) => races.len(),
            Document::Horses(_) => 0,
        }
    }

    pub fn horse_count(&self) -> usize {
        self.horses().len()
    }

    pub fn result_count(&self) -> usize {
        self.horses().iter().map(|(_, h)| h.results.len()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, Serialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    #[default]
    Auto,
    Race,
    Races,
    Horses,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentKind::Auto => "auto",
            DocumentKind::Race => "race",
            DocumentKind::Races => "races",
            DocumentKind::Horses => "horses",
        };
        f.write_str(name)
    }
}

/// extract 階段取得的原始 JSON 文字
#[derive(Debug, Clone)]
pub struct RawPayload {
    pub source: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub document: Document,
    pub horses_csv: String,
    pub results_csv: String,
    pub warnings: Vec<String>,
}
