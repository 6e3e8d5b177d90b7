//! The guaranteed local provider.
//!
//! Captions an image from its dimensions and decoded preview: orientation
//! picks the caption, the preview gives brightness, colour temperature and
//! dominant colours. It never touches the network and never fails on a
//! validated image, so the chain can always end here.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use image::RgbImage;
use shotplan_models::{ColorAnalysis, CompositionAnalysis, LightingAnalysis, ProviderKind};
use tokio::sync::OnceCell;
use tracing::info;

use crate::error::ProviderResult;
use crate::image::ImagePayload;
use crate::provider::{AnalysisProvider, CallContext, RawAnalysis};

/// Model name recorded in `provider_used`.
pub const LOCAL_MODEL: &str = "preview-captioner";

/// Named reference colours.
const PALETTE: [(&str, [u8; 3]); 12] = [
    ("black", [20, 20, 20]),
    ("gray", [128, 128, 128]),
    ("white", [235, 235, 235]),
    ("red", [200, 40, 40]),
    ("orange", [230, 130, 40]),
    ("yellow", [230, 210, 60]),
    ("green", [60, 150, 60]),
    ("teal", [40, 140, 140]),
    ("blue", [50, 90, 200]),
    ("purple", [130, 60, 160]),
    ("pink", [230, 140, 180]),
    ("brown", [120, 80, 40]),
];

/// Share of the preview a colour needs to count as dominant.
const DOMINANT_SHARE: f64 = 0.1;
const MAX_DOMINANT: usize = 3;

static SHARED: OnceLock<LocalProvider> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    Portrait,
    Square,
    Landscape,
    Panorama,
}

impl Orientation {
    fn of(width: u32, height: u32) -> Self {
        let ratio = width as f64 / height.max(1) as f64;
        if ratio < 0.85 {
            Orientation::Portrait
        } else if ratio <= 1.15 {
            Orientation::Square
        } else if ratio < 1.9 {
            Orientation::Landscape
        } else {
            Orientation::Panorama
        }
    }
}

/// What the preview pixels say.
#[derive(Debug, Clone, PartialEq)]
struct Survey {
    brightness: &'static str,
    temperature: &'static str,
    dominant: Vec<&'static str>,
}

/// Captions plus a nearest-colour table, built once per process.
///
/// A stand-in for an on-device captioning model: it measures light and colour
/// but recognises no objects, so its captions stay generic.
#[derive(Debug)]
pub struct CaptionModel {
    captions: [(Orientation, &'static str, Option<&'static str>); 4],
    /// Nearest palette index for every 4-bit-per-channel colour cell
    nearest: Vec<u8>,
}

impl CaptionModel {
    fn load() -> Self {
        let nearest: Vec<u8> = (0..4096u32)
            .map(|cell| {
                let center = [cell >> 8, (cell >> 4) & 0xF, cell & 0xF].map(|q| (q * 16 + 8) as i32);
                PALETTE
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, (_, rgb))| {
                        rgb.iter()
                            .zip(center)
                            .map(|(&c, m)| (i32::from(c) - m).pow(2))
                            .sum::<i32>()
                    })
                    .map(|(index, _)| index as u8)
                    .unwrap_or(0)
            })
            .collect();
        info!(
            model = LOCAL_MODEL,
            palette = PALETTE.len(),
            cells = nearest.len(),
            "Loaded local caption model"
        );

        Self {
            captions: [
                (
                    Orientation::Portrait,
                    "A person in a scene",
                    Some("medium_shot"),
                ),
                (
                    Orientation::Square,
                    "A subject in a scene with various elements",
                    None,
                ),
                (
                    Orientation::Landscape,
                    "A scene with various elements",
                    None,
                ),
                (
                    Orientation::Panorama,
                    "A wide view of a scene with various elements",
                    Some("wide_shot"),
                ),
            ],
            nearest,
        }
    }

    fn caption(&self, orientation: Orientation) -> (&'static str, Option<&'static str>) {
        self.captions
            .iter()
            .find(|(o, _, _)| *o == orientation)
            .map(|(_, caption, framing)| (*caption, *framing))
            .unwrap_or(("A scene with various elements", None))
    }

    fn colour_name(&self, [r, g, b]: [u8; 3]) -> usize {
        let cell = (usize::from(r >> 4) << 8) | (usize::from(g >> 4) << 4) | usize::from(b >> 4);
        self.nearest.get(cell).copied().map_or(0, usize::from)
    }

    fn survey(&self, preview: &RgbImage) -> Survey {
        let mut counts = [0u32; PALETTE.len()];
        let (mut luma, mut warmth) = (0.0, 0.0);
        for pixel in preview.pixels() {
            let [r, g, b] = pixel.0.map(f64::from);
            luma += 0.299 * r + 0.587 * g + 0.114 * b;
            warmth += r - b;
            counts[self.colour_name(pixel.0)] += 1;
        }
        let total = f64::from(preview.width() * preview.height()).max(1.0);
        let (luma, warmth) = (luma / total, warmth / total);

        let brightness = if luma > 170.0 {
            "high"
        } else if luma < 70.0 {
            "low"
        } else {
            "medium"
        };
        let temperature = if warmth > 20.0 {
            "warm"
        } else if warmth < -20.0 {
            "cool"
        } else {
            "neutral"
        };

        let mut ranked: Vec<(usize, u32)> = counts
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, count)| f64::from(*count) / total >= DOMINANT_SHARE)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let dominant = ranked
            .into_iter()
            .take(MAX_DOMINANT)
            .map(|(index, _)| PALETTE[index].0)
            .collect();

        Survey {
            brightness,
            temperature,
            dominant,
        }
    }
}

/// Offline captioner with a lazily loaded, shareable model.
#[derive(Debug, Clone, Default)]
pub struct LocalProvider {
    model: Arc<OnceCell<CaptionModel>>,
    loads: Arc<AtomicU32>,
}

impl LocalProvider {
    /// A provider with its own, not yet loaded, model.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide instance.
    pub fn shared() -> Self {
        SHARED.get_or_init(Self::new).clone()
    }

    pub fn identifier() -> String {
        format!("{}:{}", ProviderKind::Local, LOCAL_MODEL)
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    /// How many times the model has been loaded. At most one.
    pub fn load_count(&self) -> u32 {
        self.loads.load(Ordering::SeqCst)
    }

    async fn model(&self) -> &CaptionModel {
        self.model
            .get_or_init(|| async {
                self.loads.fetch_add(1, Ordering::SeqCst);
                CaptionModel::load()
            })
            .await
    }

    /// Describe a validated image. Infallible.
    pub async fn describe(&self, image: &ImagePayload) -> RawAnalysis {
        let model = self.model().await;
        let (caption, framing) = model.caption(Orientation::of(image.width(), image.height()));
        let survey = model.survey(image.preview());

        RawAnalysis {
            description: caption.to_string(),
            lighting: Some(LightingAnalysis {
                brightness: Some(survey.brightness.to_string()),
                color_temperature: Some(survey.temperature.to_string()),
            }),
            composition: framing.map(|f| CompositionAnalysis {
                framing: Some(f.to_string()),
            }),
            colors: Some(ColorAnalysis {
                dominant_colors: survey.dominant.iter().map(|c| c.to_string()).collect(),
                color_mood: None,
            }),
            technical: Some(image.technical_details()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl AnalysisProvider for LocalProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    async fn analyze(
        &self,
        image: &ImagePayload,
        _call: CallContext,
    ) -> ProviderResult<RawAnalysis> {
        Ok(self.describe(image).await)
    }
}
