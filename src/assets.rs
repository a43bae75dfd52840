use crate::actor::ActorState;
use include_dir::{include_dir, Dir, File};
use itertools::Itertools;
use thiserror::Error;
use unicode_width::UnicodeWidthStr;

/// Sprites and the default word list, baked into the binary.
pub(crate) static ASSET_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/assets");

const SPRITE_DIR: &str = "sprites";
const SPRITE_EXT: &str = ".txt";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("no {state} frames for sprite color `{color}`")]
    MissingFrames { color: String, state: ActorState },
    #[error("sprite frame `{0}` is not valid UTF-8")]
    InvalidFrame(String),
}

/// One text-art animation frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    id: String,
    art: Vec<String>,
}

impl Frame {
    pub fn new(id: impl Into<String>, art: Vec<String>) -> Self {
        Self { id: id.into(), art }
    }

    fn parse(id: &str, text: &str) -> Self {
        let mut art: Vec<String> = text.lines().map(|l| l.trim_end().to_string()).collect();
        while art.last().is_some_and(|l| l.is_empty()) {
            art.pop();
        }
        Self::new(id, art)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn art(&self) -> &[String] {
        &self.art
    }

    pub fn width(&self) -> usize {
        self.art.iter().map(|l| l.width()).max().unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.art.len()
    }
}

/// Frame lists for every actor state of one sprite color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteSet {
    color: String,
    frames: [Vec<Frame>; 3],
}

impl SpriteSet {
    /// Every state must have at least one frame.
    pub fn new(
        color: impl Into<String>,
        idle: Vec<Frame>,
        moving: Vec<Frame>,
        kick: Vec<Frame>,
    ) -> Result<Self, AssetError> {
        let color = color.into();
        let frames = [idle, moving, kick];
        for state in ActorState::ALL {
            if frames[state as usize].is_empty() {
                return Err(AssetError::MissingFrames { color, state });
            }
        }
        Ok(Self { color, frames })
    }

    /// Load the embedded frames for `color`.
    pub fn load(color: &str) -> Result<Self, AssetError> {
        let [idle, moving, kick] = ActorState::ALL;
        Self::new(
            color,
            embedded_frames(color, idle)?,
            embedded_frames(color, moving)?,
            embedded_frames(color, kick)?,
        )
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn frames(&self, state: ActorState) -> &[Frame] {
        &self.frames[state as usize]
    }

    pub fn animation_length(&self, state: ActorState) -> usize {
        self.frames(state).len()
    }
}

fn sprite_files() -> impl Iterator<Item = &'static File<'static>> {
    ASSET_DIR
        .get_dir(SPRITE_DIR)
        .into_iter()
        .flat_map(|dir| dir.files())
}

fn file_stem<'a>(file: &'a File<'_>) -> Option<&'a str> {
    file.path()
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_suffix(SPRITE_EXT))
}

/// Frames for `color`/`state`, sorted by file name.
pub fn embedded_frames(color: &str, state: ActorState) -> Result<Vec<Frame>, AssetError> {
    let prefix = format!("{color}_{state}_");
    sprite_files()
        .filter_map(|file| file_stem(file).map(|stem| (stem, file)))
        .filter(|(stem, _)| stem.starts_with(&prefix))
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .map(|(stem, file)| {
            file.contents_utf8()
                .map(|text| Frame::parse(stem, text))
                .ok_or_else(|| AssetError::InvalidFrame(stem.to_string()))
        })
        .collect()
}

/// Sprite colors that ship an idle animation.
pub fn available_colors() -> Vec<String> {
    let marker = format!("_{}_", ActorState::Idle);
    sprite_files()
        .filter_map(file_stem)
        .filter_map(|stem| stem.split_once(&marker).map(|(color, _)| color.to_string()))
        .sorted()
        .dedup()
        .collect()
}
