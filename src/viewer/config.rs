use crate::foundation::core::RectI;
use crate::foundation::error::{ViewerError, ViewerResult};
use crate::geometry::mip::tile_size;
use crate::render::pixel::{CenteredPhase, FixedPhase, JitteredPhase, PhaseStrategy};
use crate::viewer::state::RenderArgs;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

/// Seed of the default jittered decimation phase.
pub const DEFAULT_PHASE_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

/// Where the 8-bit decimation walk starts on each row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PhaseMode {
    /// Seeded pseudo-random column per row.
    Jittered { seed: u64 },
    /// Same column on every row.
    Fixed { column: usize },
    /// Middle column on every row.
    Centered,
}

impl Default for PhaseMode {
    fn default() -> Self {
        Self::Jittered {
            seed: DEFAULT_PHASE_SEED,
        }
    }
}

impl PhaseMode {
    pub fn strategy(self) -> Arc<dyn PhaseStrategy> {
        match self {
            Self::Jittered { seed } => Arc::new(JitteredPhase { seed }),
            Self::Fixed { column } => Arc::new(FixedPhase { column }),
            Self::Centered => Arc::new(CenteredPhase),
        }
    }
}

/// Options controlling a [`crate::ViewerInstance`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerOpts {
    /// Tile edge is `2^tile_size_pow2` pixels.
    pub tile_size_pow2: u32,
    /// Override the number of conversion worker threads. `None` uses hardware concurrency.
    pub threads: Option<usize>,
    pub phase: PhaseMode,
    /// Project default format: clips infinite regions and serves as the display window.
    pub project_format: RectI,
    /// When `false` the display window is the input's region of definition.
    pub clip_to_project_window: bool,
    /// Number of project views; `0` forces view index 0.
    pub views_count: u32,
    /// Initial exposure, color space and channels.
    pub initial: RenderArgs,
}

impl Default for ViewerOpts {
    fn default() -> Self {
        Self {
            tile_size_pow2: 8,
            threads: None,
            phase: PhaseMode::default(),
            project_format: RectI::from_size(1920, 1080),
            clip_to_project_window: true,
            views_count: 1,
            initial: RenderArgs::default(),
        }
    }
}

impl ViewerOpts {
    /// Parse options from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> ViewerResult<Self> {
        let opts: Self = serde_json::from_reader(r)
            .map_err(|e| ViewerError::config(format!("parse viewer options JSON: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Parse options from a JSON string.
    pub fn from_json_str(s: &str) -> ViewerResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Parse options from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ViewerResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ViewerError::config(format!("open viewer options '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> ViewerResult<()> {
        tile_size(self.tile_size_pow2)?;
        if let Some(n) = self.threads
            && n == 0
        {
            return Err(ViewerError::validation(
                "viewer 'threads' must be >= 1 when set",
            ));
        }
        if self.project_format.is_empty() || self.project_format.is_infinite() {
            return Err(ViewerError::validation(
                "viewer 'project_format' must be finite and non-empty",
            ));
        }
        let e = self.initial.exposure;
        if !e.is_finite() {
            return Err(ViewerError::validation(format!(
                "viewer initial exposure must be finite, got {e}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/viewer/config.rs"]
mod tests;
