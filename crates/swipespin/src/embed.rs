use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const RESIZE_NAMESPACE: &str = "swipe-spin-show";
pub const RESIZE_TYPE: &str = "swipe-spin-show:resize";
pub const DEFAULT_HEIGHT: CssLength = CssLength::Px(700.0);
pub const DEFAULT_WIDTH: CssLength = CssLength::Percent(100.0);

const HEIGHT_TOLERANCE: f64 = 0.5;

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Message type {0:?} is not a swipe-spin-show message")]
    Foreign(String),
    #[error("Invalid height: {0}")]
    InvalidHeight(f64),
    #[error("Invalid CSS length: {0:?}")]
    InvalidLength(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResizeMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub height: f64,
}

impl ResizeMessage {
    pub fn new(height: f64) -> Self {
        Self {
            kind: RESIZE_TYPE.to_string(),
            height,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, EmbedError> {
        let msg: Self = serde_json::from_str(raw)?;
        if msg.kind != RESIZE_TYPE {
            return Err(EmbedError::Foreign(msg.kind));
        }
        if !msg.height.is_finite() || msg.height < 0.0 {
            return Err(EmbedError::InvalidHeight(msg.height));
        }
        Ok(msg)
    }

    pub fn to_json(&self) -> Result<String, EmbedError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, SerializeDisplay, DeserializeFromStr)]
pub enum CssLength {
    Px(f64),
    Percent(f64),
}

impl FromStr for CssLength {
    type Err = EmbedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || EmbedError::InvalidLength(s.to_string());
        let (number, make): (&str, fn(f64) -> Self) = if let Some(n) = s.strip_suffix('%') {
            (n, Self::Percent)
        } else if let Some(n) = s.strip_suffix("px") {
            (n, Self::Px)
        } else {
            (s, Self::Px)
        };
        let value: f64 = number.trim().parse().map_err(|_| invalid())?;
        if !value.is_finite() || value < 0.0 {
            return Err(invalid());
        }
        Ok(make(value))
    }
}

impl fmt::Display for CssLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(v) => write!(f, "{}px", v),
            Self::Percent(v) => write!(f, "{}%", v),
        }
    }
}

impl CssLength {
    pub fn resolve(&self, parent: f64) -> f64 {
        match self {
            Self::Px(v) => *v,
            Self::Percent(p) => parent * p / 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedAttributes {
    pub height: CssLength,
    pub width: CssLength,
}

impl Default for EmbedAttributes {
    fn default() -> Self {
        Self {
            height: DEFAULT_HEIGHT,
            width: DEFAULT_WIDTH,
        }
    }
}

impl EmbedAttributes {
    /// Unparseable values fall back to the defaults.
    pub fn parse(data_height: Option<&str>, data_width: Option<&str>) -> Self {
        fn parse_or(raw: Option<&str>, name: &str, fallback: CssLength) -> CssLength {
            match raw.map(str::parse::<CssLength>) {
                None => fallback,
                Some(Ok(v)) => v,
                Some(Err(e)) => {
                    log::warn!("Ignoring {}: {}", name, e);
                    fallback
                }
            }
        }

        Self {
            height: parse_or(data_height, "data-height", DEFAULT_HEIGHT),
            width: parse_or(data_width, "data-width", DEFAULT_WIDTH),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameHeight {
    fallback: CssLength,
    reported: Option<f64>,
}

impl FrameHeight {
    pub fn new(fallback: CssLength) -> Self {
        Self {
            fallback,
            reported: None,
        }
    }

    pub fn height(&self) -> CssLength {
        self.reported.map_or(self.fallback, CssLength::Px)
    }

    pub fn reported(&self) -> Option<f64> {
        self.reported
    }

    /// Returns whether the frame has to be resized.
    pub fn apply(&mut self, msg: &ResizeMessage) -> bool {
        if self
            .reported
            .is_some_and(|h| (h - msg.height).abs() < HEIGHT_TOLERANCE)
        {
            return false;
        }
        self.reported = Some(msg.height);
        true
    }

    pub fn apply_raw(&mut self, raw: &str) -> Result<bool, EmbedError> {
        let msg = ResizeMessage::from_json(raw)?;
        Ok(self.apply(&msg))
    }
}

impl Default for FrameHeight {
    fn default() -> Self {
        Self::new(DEFAULT_HEIGHT)
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeightReporter {
    last: Option<f64>,
}

impl HeightReporter {
    pub fn report(&mut self, height: f64) -> Option<ResizeMessage> {
        if !height.is_finite() || height < 0.0 {
            log::warn!("Not reporting invalid content height {}", height);
            return None;
        }
        if self
            .last
            .is_some_and(|h| (h - height).abs() < HEIGHT_TOLERANCE)
        {
            return None;
        }
        self.last = Some(height);
        Some(ResizeMessage::new(height))
    }

    /// Forget the last height so the next report always goes out (after a remount).
    pub fn reset(&mut self) {
        self.last = None;
    }
}
