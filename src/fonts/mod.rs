//! Font discovery, registration and fallback selection.
//!
//! Fonts are tried from an ordered list of [`FontCandidate`]s. The first candidate whose regular
//! file exists and registers successfully wins; when none does, the built-in Helvetica family is
//! used instead. Loaded font data lives in a caller-owned [`FontRegistry`] rather than in any
//! process-wide state.

mod encoding;

use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use genpdf::fonts::{FontData, FontFamily};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

pub use encoding::{fold_to_win1252, is_win1252};

/// The role a font plays inside a [`FontSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontRole {
    Regular,
    Bold,
    Italic,
}

impl fmt::Display for FontRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FontRole::Regular => "regular",
            FontRole::Bold => "bold",
            FontRole::Italic => "italic",
        })
    }
}

/// Faces of the built-in fallback family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinFace {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
}

impl BuiltinFace {
    pub fn name(self) -> &'static str {
        match self {
            BuiltinFace::Helvetica => "Helvetica",
            BuiltinFace::HelveticaBold => "Helvetica-Bold",
            BuiltinFace::HelveticaOblique => "Helvetica-Oblique",
        }
    }
}

impl From<BuiltinFace> for printpdf::BuiltinFont {
    fn from(face: BuiltinFace) -> Self {
        match face {
            BuiltinFace::Helvetica => printpdf::BuiltinFont::Helvetica,
            BuiltinFace::HelveticaBold => printpdf::BuiltinFont::HelveticaBold,
            BuiltinFace::HelveticaOblique => printpdf::BuiltinFont::HelveticaOblique,
        }
    }
}

/// Where the glyphs of a [`FontHandle`] come from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FontSource {
    File(PathBuf),
    Builtin(BuiltinFace),
}

/// Opaque reference to a registered font.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FontHandle {
    name: String,
    source: FontSource,
}

impl FontHandle {
    fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: FontSource::File(path.into()),
        }
    }

    fn builtin(face: BuiltinFace) -> Self {
        Self {
            name: face.name().to_owned(),
            source: FontSource::Builtin(face),
        }
    }

    /// Identifier the font was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &FontSource {
        &self.source
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.source, FontSource::Builtin(_))
    }
}

impl fmt::Display for FontHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The three font roles used by the report styles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontSet {
    pub regular: FontHandle,
    pub bold: FontHandle,
    pub italic: FontHandle,
}

impl FontSet {
    /// The built-in Helvetica family, always available to the PDF engine.
    pub fn builtin() -> Self {
        Self {
            regular: FontHandle::builtin(BuiltinFace::Helvetica),
            bold: FontHandle::builtin(BuiltinFace::HelveticaBold),
            italic: FontHandle::builtin(BuiltinFace::HelveticaOblique),
        }
    }

    pub fn handle(&self, role: FontRole) -> &FontHandle {
        match role {
            FontRole::Regular => &self.regular,
            FontRole::Bold => &self.bold,
            FontRole::Italic => &self.italic,
        }
    }

    /// Whether the set is the built-in fallback family.
    pub fn is_builtin(&self) -> bool {
        self.regular.is_builtin()
    }

    /// Whether `handle` fills one of the three roles.
    pub fn contains(&self, handle: &FontHandle) -> bool {
        [&self.regular, &self.bold, &self.italic]
            .into_iter()
            .any(|candidate| candidate == handle)
    }
}

/// A font file to try, optionally with bold and italic siblings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontCandidate {
    pub regular: PathBuf,
    #[serde(default)]
    pub bold: Option<PathBuf>,
    #[serde(default)]
    pub italic: Option<PathBuf>,
}

impl FontCandidate {
    /// A candidate without siblings; its regular face fills every role.
    pub fn single(regular: impl Into<PathBuf>) -> Self {
        Self {
            regular: regular.into(),
            bold: None,
            italic: None,
        }
    }

    /// A candidate with explicit bold and italic siblings.
    pub fn family(
        regular: impl Into<PathBuf>,
        bold: impl Into<PathBuf>,
        italic: impl Into<PathBuf>,
    ) -> Self {
        Self {
            regular: regular.into(),
            bold: Some(bold.into()),
            italic: Some(italic.into()),
        }
    }

    /// DejaVu Sans (regular, bold, oblique) inside `directory`.
    pub fn dejavu_in(directory: &Path) -> Self {
        Self::family(
            directory.join("DejaVuSans.ttf"),
            directory.join("DejaVuSans-Bold.ttf"),
            directory.join("DejaVuSans-Oblique.ttf"),
        )
    }
}

/// Candidates tried when the configuration does not name any.
///
/// DejaVu Sans and Arial Unicode both cover Romanian diacritics.
pub fn default_candidates() -> Vec<FontCandidate> {
    vec![
        FontCandidate::dejavu_in(Path::new("/usr/share/fonts/truetype/dejavu")),
        FontCandidate::dejavu_in(Path::new("/usr/share/fonts/dejavu")),
        FontCandidate::dejavu_in(Path::new("/Library/Fonts")),
        FontCandidate::single("/System/Library/Fonts/Supplemental/Arial Unicode.ttf"),
        FontCandidate::single("/Library/Fonts/Arial Unicode.ttf"),
        FontCandidate::single("/System/Library/Fonts/Helvetica.ttc"),
    ]
}

/// Metric files used to lay out text set in the built-in Helvetica family.
///
/// The PDF viewer supplies Helvetica itself, but line wrapping still needs glyph widths, so a
/// metric-compatible TrueType family is loaded alongside.
pub fn default_fallback_metrics() -> Vec<FontCandidate> {
    let mut candidates = vec![
        FontCandidate::family(
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Italic.ttf",
        ),
        FontCandidate::family(
            "/usr/share/fonts/truetype/liberation2/LiberationSans-Regular.ttf",
            "/usr/share/fonts/truetype/liberation2/LiberationSans-Bold.ttf",
            "/usr/share/fonts/truetype/liberation2/LiberationSans-Italic.ttf",
        ),
        FontCandidate::family(
            "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
            "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
            "/usr/share/fonts/liberation-sans/LiberationSans-Italic.ttf",
        ),
    ];

    if let Some(directory) = windows_font_directory() {
        candidates.push(FontCandidate::family(
            directory.join("arial.ttf"),
            directory.join("arialbd.ttf"),
            directory.join("ariali.ttf"),
        ));
    }

    candidates.extend(default_candidates());
    candidates
}

/// Path from environment variable `var`; unset and empty values give `None`.
pub(crate) fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
}

fn windows_font_directory() -> Option<PathBuf> {
    ["WINDIR", "SystemRoot"]
        .into_iter()
        .filter_map(env_path)
        .map(|root| root.join("Fonts"))
        .find(|candidate| candidate.is_dir())
}

/// Loads raw font files into whatever representation the rendering engine needs.
pub trait FontLoader {
    type Data: Clone;

    fn load(&self, path: &Path) -> std::result::Result<Self::Data, genpdf::error::Error>;
}

/// Loads TrueType files through `genpdf`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TrueTypeLoader;

impl FontLoader for TrueTypeLoader {
    type Data = FontData;

    fn load(&self, path: &Path) -> std::result::Result<FontData, genpdf::error::Error> {
        FontData::load(path, None)
    }
}

/// Caller-owned store of registered fonts.
pub struct FontRegistry<L: FontLoader = TrueTypeLoader> {
    loader: L,
    fonts: BTreeMap<String, L::Data>,
}

impl FontRegistry<TrueTypeLoader> {
    pub fn new() -> Self {
        Self::with_loader(TrueTypeLoader)
    }
}

impl Default for FontRegistry<TrueTypeLoader> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: FontLoader> FontRegistry<L> {
    pub fn with_loader(loader: L) -> Self {
        Self {
            loader,
            fonts: BTreeMap::new(),
        }
    }

    /// Loads the font at `path` and registers it under its file stem.
    pub fn register(&mut self, path: &Path) -> Result<FontHandle> {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let data = self
            .loader
            .load(path)
            .map_err(|source| ReportError::FontUnavailable {
                name: name.clone(),
                path: path.to_path_buf(),
                source,
            })?;

        debug!("Registered font '{}' from {}", name, path.display());
        self.fonts.insert(name.clone(), data);
        Ok(FontHandle::file(name, path))
    }

    pub fn get(&self, handle: &FontHandle) -> Option<&L::Data> {
        self.fonts.get(handle.name())
    }

    pub fn contains(&self, handle: &FontHandle) -> bool {
        self.fonts.contains_key(handle.name())
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

impl FontRegistry<TrueTypeLoader> {
    /// Builds the `genpdf` font family backing `fonts`.
    ///
    /// File-backed sets come straight from the registry. The built-in set is materialised from
    /// the first usable entry of `fallback_metrics`; failing that is the one fatal font error.
    pub fn font_family(
        &self,
        fonts: &FontSet,
        fallback_metrics: &[FontCandidate],
    ) -> Result<FontFamily<FontData>> {
        if fonts.is_builtin() {
            return builtin_family(fallback_metrics);
        }

        let lookup = |role: FontRole| -> Result<FontData> {
            let handle = fonts.handle(role);
            self.get(handle)
                .cloned()
                .ok_or_else(|| ReportError::UnregisteredFont {
                    style: role.to_string(),
                    font: handle.name().to_owned(),
                })
        };

        let bold = lookup(FontRole::Bold)?;
        Ok(FontFamily {
            regular: lookup(FontRole::Regular)?,
            italic: lookup(FontRole::Italic)?,
            bold_italic: bold.clone(),
            bold,
        })
    }
}

fn builtin_family(metrics: &[FontCandidate]) -> Result<FontFamily<FontData>> {
    let mut attempts = Vec::new();

    for candidate in metrics {
        if !candidate.regular.is_file() {
            attempts.push(format!("{} (missing)", candidate.regular.display()));
            continue;
        }

        let load = |path: &Option<PathBuf>, face: BuiltinFace| {
            let path = path
                .as_deref()
                .filter(|path| path.is_file())
                .unwrap_or(candidate.regular.as_path());
            FontData::load(path, Some(face.into()))
        };

        let family = (|| {
            let bold = load(&candidate.bold, BuiltinFace::HelveticaBold)?;
            Ok::<_, genpdf::error::Error>(FontFamily {
                regular: load(&None, BuiltinFace::Helvetica)?,
                italic: load(&candidate.italic, BuiltinFace::HelveticaOblique)?,
                bold_italic: bold.clone(),
                bold,
            })
        })();

        match family {
            Ok(family) => {
                debug!(
                    "Using {} as metrics for the built-in Helvetica family",
                    candidate.regular.display()
                );
                return Ok(family);
            }
            Err(err) => attempts.push(format!("{} ({})", candidate.regular.display(), err)),
        }
    }

    let summary = if attempts.is_empty() {
        "no metric files were configured".to_owned()
    } else {
        format!("checked {}", attempts.join(", "))
    };
    Err(ReportError::FallbackUnavailable(summary))
}

/// How the final [`FontSet`] was chosen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontOrigin {
    /// The candidate at `index` in the candidate list.
    Candidate { index: usize },
    /// No candidate was usable.
    Fallback,
}

/// Outcome of [`resolve_fonts`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontResolution {
    pub fonts: FontSet,
    pub origin: FontOrigin,
    /// Diagnostics for the caller, such as skipped candidates or reduced glyph coverage.
    pub warnings: Vec<String>,
}

impl FontResolution {
    pub fn is_fallback(&self) -> bool {
        self.origin == FontOrigin::Fallback
    }
}

/// Selects the first registrable candidate, in list order.
///
/// Never fails: when nothing can be registered the built-in family is returned together with a
/// warning about glyph coverage.
pub fn resolve_fonts<L: FontLoader>(
    candidates: &[FontCandidate],
    registry: &mut FontRegistry<L>,
) -> FontResolution {
    let mut warnings = Vec::new();

    for (index, candidate) in candidates.iter().enumerate() {
        if !candidate.regular.is_file() {
            debug!("Font candidate {} not found", candidate.regular.display());
            continue;
        }

        let regular = match registry.register(&candidate.regular) {
            Ok(handle) => handle,
            Err(err) => {
                warn!("Skipping font candidate: {}", err);
                warnings.push(err.to_string());
                continue;
            }
        };

        let mut sibling = |path: &Option<PathBuf>, role: FontRole| -> FontHandle {
            let Some(path) = path.as_deref().filter(|path| path.is_file()) else {
                return regular.clone();
            };
            registry.register(path).unwrap_or_else(|err| {
                warn!("Using regular face for {} role: {}", role, err);
                regular.clone()
            })
        };

        let bold = sibling(&candidate.bold, FontRole::Bold);
        let italic = sibling(&candidate.italic, FontRole::Italic);

        info!(
            "Using font '{}' from {}",
            regular,
            candidate.regular.display()
        );
        return FontResolution {
            fonts: FontSet {
                regular,
                bold,
                italic,
            },
            origin: FontOrigin::Candidate { index },
            warnings,
        };
    }

    let message = "No candidate font could be registered; using built-in Helvetica. \
                   Diacritics outside Windows-1252 will be approximated.";
    warn!("{}", message);
    warnings.push(message.to_owned());

    FontResolution {
        fonts: FontSet::builtin(),
        origin: FontOrigin::Fallback,
        warnings,
    }
}
