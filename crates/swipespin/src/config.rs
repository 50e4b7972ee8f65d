use crate::carousel::geometry::{BreakpointTable, LayoutOptions, RotationMode};
use crate::carousel::gesture::{DEFAULT_DEAD_ZONE, DEFAULT_SENSITIVITY, GestureConfig};
use crate::carousel::momentum::{
    DEFAULT_DECAY, DEFAULT_EPSILON, DEFAULT_SNAP_DURATION, DEFAULT_WHEEL_SETTLE, MomentumConfig,
};
use crate::carousel::velocity::DEFAULT_WINDOW;
use crate::embed::EmbedAttributes;
use derive_more::{Display, From, Into};
use directories::ProjectDirs;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use palette::{Srgb, Srgba, WithAlpha};
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, DurationMilliSeconds, SerializeDisplay, serde_as};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct CardId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, SerializeDisplay, DeserializeFromStr)]
pub struct CardColor(Srgb<u8>);

impl CardColor {
    pub const WHITE: Self = Self(Srgb::new(255, 255, 255));
    pub const BLACK: Self = Self(Srgb::new(0, 0, 0));

    pub fn to_srgba(self, alpha: f64) -> Srgba<f64> {
        self.0.into_format::<f64>().with_alpha(alpha)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid color: {0:?}")]
pub struct ColorParseError(String);

impl FromStr for CardColor {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "white" => return Ok(Self::WHITE),
            "black" => return Ok(Self::BLACK),
            _ => {}
        }
        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
        let channels = match hex.len() {
            6 => hex.to_string(),
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            _ => return Err(ColorParseError(s.to_string())),
        };
        let byte = |i: usize| {
            channels
                .get(i..i + 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| ColorParseError(s.to_string()))
        };
        Ok(Self(Srgb::new(byte(0)?, byte(2)?, byte(4)?)))
    }
}

impl fmt::Display for CardColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0.red, self.0.green, self.0.blue)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Media {
    Image(PathBuf),
    Video(PathBuf),
    Placeholder(String),
}

impl Default for Media {
    fn default() -> Self {
        Self::Placeholder(String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub media: Media,
    pub bg_color: Option<CardColor>,
    pub text_color: Option<CardColor>,
}

impl Card {
    pub fn new(id: CardId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            media: Media::default(),
            bg_color: None,
            text_color: None,
        }
    }

    pub fn background(&self) -> CardColor {
        self.bg_color.unwrap_or(CardColor::WHITE)
    }

    pub fn foreground(&self) -> CardColor {
        self.text_color.unwrap_or(CardColor::BLACK)
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselConfig {
    pub cards: Vec<Card>,
    pub breakpoints: BreakpointTable,
    pub rotation: RotationMode,
    pub depth_fade: bool,
    pub wheel: bool,
    pub sensitivity: f64,
    pub decay: f64,
    pub epsilon: f64,
    pub dead_zone: f64,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub snap_duration: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub velocity_window: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub wheel_settle: Duration,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            cards: Vec::new(),
            breakpoints: BreakpointTable::default(),
            rotation: RotationMode::default(),
            depth_fade: false,
            wheel: true,
            sensitivity: DEFAULT_SENSITIVITY,
            decay: DEFAULT_DECAY,
            epsilon: DEFAULT_EPSILON,
            dead_zone: DEFAULT_DEAD_ZONE,
            snap_duration: DEFAULT_SNAP_DURATION,
            velocity_window: DEFAULT_WINDOW,
            wheel_settle: DEFAULT_WHEEL_SETTLE,
        }
    }
}

impl CarouselConfig {
    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            mode: self.rotation,
            depth_fade: self.depth_fade,
        }
    }

    pub fn gesture_config(&self) -> GestureConfig {
        GestureConfig {
            dead_zone: self.dead_zone,
            sensitivity: self.sensitivity,
            velocity_window: self.velocity_window,
        }
    }

    pub fn momentum_config(&self) -> MomentumConfig {
        MomentumConfig {
            sensitivity: self.sensitivity,
            decay: self.decay,
            epsilon: self.epsilon,
            snap_duration: self.snap_duration,
        }
    }

    /// Ids that appear more than once. Rendering still keys cards by position.
    pub fn duplicate_ids(&self) -> Vec<CardId> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        self.cards
            .iter()
            .map(|c| c.id)
            .filter(|id| !seen.insert(*id) && reported.insert(*id))
            .collect()
    }

    pub fn card(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub headline: String,
    pub hint: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            headline: "Impact by Design".to_string(),
            hint: "Drag to explore".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub carousel: CarouselConfig,
    #[serde(default)]
    pub page: PageConfig,
    #[serde(default)]
    pub embed: EmbedAttributes,
}

impl Config {
    fn validated(mut self) -> Self {
        for breakpoint in self.carousel.breakpoints.sanitize() {
            log::warn!(
                "Invalid geometry for the {} breakpoint; using the defaults",
                breakpoint
            );
        }
        for id in self.carousel.duplicate_ids() {
            log::warn!("Card id {} is used more than once", id);
        }
        if self.carousel.cards.is_empty() {
            log::warn!("No cards configured; the carousel will be empty");
        }
        self
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs = ProjectDirs::from("org", "swipespin", "swipespin")
        .ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("SWIPESPIN")
        .separator("__")
        .try_parsing(true)
}

pub fn load_config() -> Result<Config, ConfigError> {
    let config_path = get_config_path()?;

    let s = config::Config::builder()
        .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
        .add_source(config::File::from(config_path).required(false))
        .add_source(environment())
        .build()?;

    Ok(s.try_deserialize::<Config>()?.validated())
}

pub fn bundled_config() -> Result<Config, ConfigError> {
    let s = config::Config::builder()
        .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
        .build()?;
    Ok(s.try_deserialize()?)
}

pub fn load_or_setup() -> Config {
    match load_config() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to load config, using bundled defaults: {}", e);
            bundled_config().unwrap_or_default()
        }
    }
}

pub fn write_default_config() -> std::io::Result<PathBuf> {
    let path =
        get_config_path().map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e))?;
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs_err::write(&path, DEFAULT_CONFIG)?;
        log::info!("Wrote default config to {}", path.display());
    }
    Ok(path)
}

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

use crate::events::AppEvent;
use async_channel::Sender;

pub async fn run_async_watcher(tx: Sender<AppEvent>) {
    let config_path = match get_config_path() {
        Ok(p) => p,
        Err(e) => {
            log::error!("Config watcher error: {}", e);
            return;
        }
    };
    let Some(config_dir) = config_path.parent().map(|p| p.to_path_buf()) else {
        return;
    };

    if let Err(e) = fs_err::create_dir_all(&config_dir) {
        log::error!("Failed to create config directory for watching: {}", e);
        return;
    }

    let (bridge_tx, bridge_rx) = async_channel::unbounded();

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            log::error!("Failed to create watcher: {}", e);
            return;
        }
    };

    if let Err(e) = watcher.watch(&config_dir, RecursiveMode::NonRecursive) {
        log::error!("Failed to watch config directory: {}", e);
        return;
    }

    while let Ok(res) = bridge_rx.recv().await {
        match res {
            Ok(event) => {
                let touches_config = matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                ) && event.paths.iter().any(|p| p == &config_path);

                if touches_config {
                    log::info!("Config changed, reloading");
                    if tx.send(AppEvent::ConfigReload).await.is_err() {
                        break;
                    }
                }
            }
            Err(e) => log::error!("Watch error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carousel::geometry::Breakpoint;

    #[test]
    fn test_card_color_parsing() {
        let cases = [
            ("white", CardColor::WHITE),
            ("WHITE", CardColor::WHITE),
            ("#ffffff", CardColor::WHITE),
            ("000", CardColor::BLACK),
            ("#224F3C", CardColor(Srgb::new(0x22, 0x4F, 0x3C))),
            ("#333", CardColor(Srgb::new(0x33, 0x33, 0x33))),
        ];
        for (input, expected) in cases {
            assert_eq!(input.parse::<CardColor>().unwrap(), expected, "{input}");
        }
        assert!("#12345".parse::<CardColor>().is_err());
        assert!("teal".parse::<CardColor>().is_err());
        assert!("#gg0000".parse::<CardColor>().is_err());
    }

    #[test]
    fn test_card_color_serializes_as_hex() {
        let json = serde_json::to_string(&CardColor(Srgb::new(0x58, 0xB4, 0x69))).unwrap();
        assert_eq!(json, "\"#58B469\"");
        let back: CardColor = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_string(), "#58B469");
    }

    #[test]
    fn test_carousel_config_defaults_and_durations() {
        let json = r##"{
            "rotation": "clamp",
            "snap_duration": 250,
            "cards": [
                { "id": 1, "title": "A", "description": "a", "media": { "image": "a.png" } },
                { "id": 2, "title": "B", "description": "b", "bg_color": "#0D2B1E" }
            ]
        }"##;
        let cfg: CarouselConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.rotation, RotationMode::Bounded);
        assert_eq!(cfg.snap_duration, Duration::from_millis(250));
        assert_eq!(cfg.wheel_settle, DEFAULT_WHEEL_SETTLE);
        assert_eq!(cfg.sensitivity, 0.12);
        assert!(cfg.wheel);
        assert_eq!(cfg.cards[0].media, Media::Image(PathBuf::from("a.png")));
        assert_eq!(cfg.cards[1].media, Media::default());
        assert_eq!(cfg.cards[1].foreground(), CardColor::BLACK);
        assert_eq!(cfg.breakpoints.resolve(800.0), Breakpoint::Medium);
        assert_eq!(cfg.momentum_config().snap_duration, Duration::from_millis(250));
        assert_eq!(cfg.gesture_config().dead_zone, 8.0);
    }

    #[test]
    fn test_duplicate_ids_are_reported_once() {
        let cfg = CarouselConfig {
            cards: [1, 2, 2, 3, 2]
                .into_iter()
                .map(|i| Card::new(CardId::from(i), "t", "d"))
                .collect(),
            ..CarouselConfig::default()
        };
        assert_eq!(cfg.duplicate_ids(), vec![CardId::from(2)]);
    }

    #[test]
    fn test_bundled_config_has_five_cards() {
        let cfg = bundled_config().unwrap();
        let cards = &cfg.carousel.cards;
        assert_eq!(cards.len(), 5);
        assert!(cfg.carousel.duplicate_ids().is_empty());
        assert_eq!(cards[0].title, "92% ARR Growth");
        assert_eq!(cards[0].background().to_string(), "#224F3C");
        assert_eq!(cards[2].foreground().to_string(), "#333333");
        assert_eq!(cfg.page.headline, "Impact by Design");
        assert_eq!(cfg.embed, EmbedAttributes::default());
    }

    #[test]
    fn test_validated_replaces_negative_arc_span() {
        let mut cfg = bundled_config().unwrap();
        cfg.carousel.rotation = RotationMode::Bounded;
        cfg.carousel.breakpoints.small.arc_span = -18.0;

        let cfg = cfg.validated();
        assert_eq!(cfg.carousel.breakpoints.small.arc_span, 18.0);

        let mut carousel = crate::carousel::Carousel::new(cfg.carousel, 375.0);
        assert!(carousel.wheel(-50.0, 0.0).relayout);
        assert_eq!(carousel.rotation(), 0.0);
    }
}
