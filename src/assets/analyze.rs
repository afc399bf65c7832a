//! Filing suggestions for images: a category, tags and a house-style name,
//! derived from the name the file was uploaded with.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::AssetStore;
use crate::error::{ItemFailure, StoreError};
use crate::storage::models::{MediaFilter, MediaRecord, MediaUpdate, Patch};

const DEFAULT_CATEGORY: &str = "général";
const ANALYZE_LIMIT: usize = 500;
const PREVIEW_LIMIT: usize = 50;
const APPLIED_RESULT_LIMIT: usize = 20;
/// Names already in house style are never renamed.
const CURATED_PREFIXES: &[&str] = &["spectacle-", "logo-"];

lazy_static! {
    static ref SEASON_RE: Regex = Regex::new(r"(\d{2})-(\d{2})").unwrap();
    static ref PAGE_RE: Regex = Regex::new(r"page-(\d+)").unwrap();
    static ref CAMERA_RE: Regex = Regex::new(r"^img[_-]?\d+").unwrap();
}

/// What an image should be called and filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub name: String,
    pub category: &'static str,
    pub tags: Vec<String>,
}

/// A more specific match inside a rule: first hit wins.
struct Variant {
    keywords: &'static [&'static str],
    name: &'static str,
    tags: &'static [&'static str],
}

struct Rule {
    matches: fn(&str) -> bool,
    category: &'static str,
    tags: &'static [&'static str],
    name: Option<&'static str>,
    variants: &'static [Variant],
    refine: Option<fn(&str, &mut Suggestion)>,
}

fn contains_any(name: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| name.contains(k))
}

const LOGO_VARIANTS: &[Variant] = &[
    Variant { keywords: &["tnt"], name: "logo-tnt.jpg", tags: &["partenaire", "théâtre"] },
    Variant { keywords: &["ccas"], name: "logo-ccas-toul.jpg", tags: &["partenaire", "social"] },
    Variant { keywords: &["csc"], name: "logo-csc-toul.jpg", tags: &["partenaire", "social"] },
    Variant { keywords: &["heron", "héron"], name: "logo-heron.png", tags: &["compagnie"] },
    Variant { keywords: &["mosaique", "mosaïque"], name: "logo-mosaique.jpg", tags: &["partenaire"] },
    Variant {
        keywords: &["territoire"],
        name: "logo-territoire.gif",
        tags: &["partenaire", "institutionnel"],
    },
    Variant { keywords: &["tota"], name: "logo-tota-compania.png", tags: &["compagnie", "identite"] },
    Variant { keywords: &["cc"], name: "logo-centre-culturel.png", tags: &["lieu", "vauban"] },
];

const CONTE_VARIANTS: &[Variant] = &[Variant {
    keywords: &["blancs"],
    name: "spectacle-contes-blancs.png",
    tags: &["contes-blancs"],
}];

const MPDTR_VARIANTS: &[Variant] = &[
    Variant { keywords: &["mandres"], name: "mpdtr-mandres.jpg", tags: &["mandres"] },
    Variant { keywords: &["pagney"], name: "mpdtr-pagney.jpg", tags: &["pagney"] },
    Variant {
        keywords: &["maennolsheim"],
        name: "mpdtr-maennolsheim.jpg",
        tags: &["maennolsheim"],
    },
];

const FESTIVAL_VARIANTS: &[Variant] = &[
    Variant {
        keywords: &["tita", "familia"],
        name: "festival-tota-familia.png",
        tags: &["tota-familia"],
    },
    Variant { keywords: &["renc"], name: "festival-rencarts.png", tags: &["rencarts"] },
];

/// Show acronyms used in price sheet names.
const PRICE_SHEET_VARIANTS: &[Variant] = &[
    Variant { keywords: &["xy"], name: "fiche-tarifaire-XY-et-moi.pdf", tags: &["XY-et-moi"] },
    Variant { keywords: &["vdt"], name: "fiche-tarifaire-vert-de-terre.pdf", tags: &["vert-de-terre"] },
    Variant { keywords: &["pv"], name: "fiche-tarifaire-piteur-vieux.pdf", tags: &["piteur-vieux"] },
    Variant {
        keywords: &["ns"],
        name: "fiche-tarifaire-ne-songez-pas.pdf",
        tags: &["ne-songez-pas"],
    },
    Variant { keywords: &["cdm"], name: "fiche-tarifaire-colorez-moi.pdf", tags: &["colorez-moi"] },
];

fn refine_colorez(name: &str, suggestion: &mut Suggestion) {
    suggestion.name = if name.ends_with(".pdf") {
        "dossier-colorez-moi.pdf".to_string()
    } else {
        "spectacle-colorez-moi.png".to_string()
    };
}

fn refine_season(name: &str, suggestion: &mut Suggestion) {
    if let Some(season) = SEASON_RE.captures(name) {
        suggestion.tags.push(format!("saison-{}-{}", &season[1], &season[2]));
    }
    if let Some(page) = PAGE_RE.captures(name) {
        suggestion.name = format!("programme-saison-page-{}.jpg", &page[1]);
    }
}

/// Evaluated in order; the first matching rule decides.
const RULES: &[Rule] = &[
    Rule {
        matches: |n| n.contains("logo"),
        category: "logos",
        tags: &["logo"],
        name: None,
        variants: LOGO_VARIANTS,
        refine: None,
    },
    Rule {
        matches: |n| n.contains("toul") && contains_any(n, &["cmjn", "ville"]),
        category: "logos",
        tags: &["logo", "partenaire", "institutionnel", "toul"],
        name: Some("logo-ville-de-toul.jpg"),
        variants: &[],
        refine: None,
    },
    Rule {
        matches: |n| n.contains("partenaire"),
        category: "logos",
        tags: &["partenaires", "compilation"],
        name: Some("partenaires-compilation.png"),
        variants: &[],
        refine: None,
    },
    Rule {
        matches: |n| contains_any(n, &["spectacle", "scène", "théâtre"]),
        category: "spectacles",
        tags: &["spectacle", "scène"],
        name: None,
        variants: &[],
        refine: None,
    },
    Rule {
        matches: |n| n.contains("conte"),
        category: "spectacles",
        tags: &["spectacle", "conte"],
        name: None,
        variants: CONTE_VARIANTS,
        refine: None,
    },
    Rule {
        matches: |n| n.contains("colorez"),
        category: "spectacles",
        tags: &["spectacle", "colorez-moi"],
        name: None,
        variants: &[],
        refine: Some(refine_colorez),
    },
    Rule {
        matches: |n| contains_any(n, &["mpdtr", "mdp"]),
        category: "événements",
        tags: &["mpdtr", "théâtre-rire", "événement"],
        name: None,
        variants: MPDTR_VARIANTS,
        refine: None,
    },
    Rule {
        matches: |n| contains_any(n, &["saison", "programme"]),
        category: "documents",
        tags: &["programme", "saison"],
        name: None,
        variants: &[],
        refine: Some(refine_season),
    },
    Rule {
        matches: |n| contains_any(n, &["festival", "tita", "renc"]),
        category: "événements",
        tags: &["festival"],
        name: None,
        variants: FESTIVAL_VARIANTS,
        refine: None,
    },
    Rule {
        matches: |n| contains_any(n, &["atelier", "stage"]),
        category: "ateliers",
        tags: &["atelier", "formation"],
        name: None,
        variants: &[],
        refine: None,
    },
    Rule {
        matches: |n| contains_any(n, &["residen", "res-art"]),
        category: "résidences",
        tags: &["résidence", "artiste"],
        name: Some("résidence-artistique.png"),
        variants: &[],
        refine: None,
    },
    Rule {
        matches: |n| n.contains("vaub"),
        category: "lieux",
        tags: &["vauban", "lieu", "centre-culturel"],
        name: Some("centre-culturel-vauban.png"),
        variants: &[],
        refine: None,
    },
    Rule {
        matches: |n| CAMERA_RE.is_match(n),
        category: "photos",
        tags: &["photo", "événement"],
        name: None,
        variants: &[],
        refine: None,
    },
    Rule {
        matches: |n| n.contains("fichetarifaire") || (n.contains("fiche") && n.contains("tarif")),
        category: "documents",
        tags: &["tarif", "document", "professionnel"],
        name: None,
        variants: PRICE_SHEET_VARIANTS,
        refine: None,
    },
    Rule {
        matches: |n| n.contains("dossier"),
        category: "documents",
        tags: &["dossier", "artistique", "professionnel"],
        name: None,
        variants: &[],
        refine: None,
    },
    Rule {
        matches: |n| contains_any(n, &["article", "presse", "journal"]),
        category: "presse",
        tags: &["article", "presse", "media"],
        name: None,
        variants: &[],
        refine: None,
    },
];

/// Suggest a category, tags and name for an upload. Names that match no rule
/// keep their name and land in the default category without tags.
pub fn suggest(original_name: &str) -> Suggestion {
    let lowered = original_name.to_lowercase();
    let mut suggestion = Suggestion {
        name: original_name.to_string(),
        category: DEFAULT_CATEGORY,
        tags: Vec::new(),
    };

    let Some(rule) = RULES.iter().find(|rule| (rule.matches)(&lowered)) else {
        return suggestion;
    };

    suggestion.category = rule.category;
    suggestion.tags = rule.tags.iter().map(|t| t.to_string()).collect();
    if let Some(name) = rule.name {
        suggestion.name = name.to_string();
    }
    if let Some(variant) = rule
        .variants
        .iter()
        .find(|v| contains_any(&lowered, v.keywords))
    {
        suggestion.name = variant.name.to_string();
        suggestion.tags.extend(variant.tags.iter().map(|t| t.to_string()));
    }
    if let Some(refine) = rule.refine {
        refine(&lowered, &mut suggestion);
    }

    suggestion
}

// ============================================================================
// Reports
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct NameSuggestion {
    pub id: String,
    pub current_name: String,
    pub suggested_name: String,
    pub current_category: Option<String>,
    pub suggested_category: String,
    pub current_tags: Vec<String>,
    pub suggested_tags: Vec<String>,
    pub needs_rename: bool,
    pub needs_category_update: bool,
}

impl NameSuggestion {
    fn needs_change(&self) -> bool {
        self.needs_rename || self.needs_category_update
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalyzeStats {
    pub total: u64,
    pub needs_rename: u64,
    pub needs_category_update: u64,
    pub by_category: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeReport {
    pub stats: AnalyzeStats,
    pub suggestions: Vec<NameSuggestion>,
}

/// Which images to update: the listed ids, or every image when `apply_all`
/// is set or no id is given.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeSelection {
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub apply_all: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppliedSuggestion {
    pub id: String,
    pub old_name: String,
    pub new_name: String,
    pub category: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalyzeApplyReport {
    pub updated: u64,
    pub failed: Vec<ItemFailure>,
    /// First results only
    pub results: Vec<AppliedSuggestion>,
}

impl AssetStore {
    /// Image records, oldest first.
    fn images(&self) -> Result<Vec<MediaRecord>, StoreError> {
        let filter = MediaFilter {
            mime_type: Some("image".to_string()),
            ..Default::default()
        };
        let mut images = self.db.list_media(&filter)?;
        images.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(images)
    }

    /// Suggestions for up to 500 images. With `changes_only`, the list keeps
    /// the first 50 images whose name or category would change; the stats
    /// always cover every analyzed image.
    pub fn analyze_preview(&self, changes_only: bool) -> Result<AnalyzeReport, StoreError> {
        let suggestions: Vec<NameSuggestion> = self
            .images()?
            .into_iter()
            .take(ANALYZE_LIMIT)
            .map(|record| {
                let suggestion = suggest(&record.original_name);
                NameSuggestion {
                    needs_rename: record.original_name != suggestion.name,
                    needs_category_update: record.category.as_deref()
                        != Some(suggestion.category),
                    id: record.id,
                    current_name: record.original_name,
                    suggested_name: suggestion.name,
                    current_category: record.category,
                    suggested_category: suggestion.category.to_string(),
                    current_tags: record.tags,
                    suggested_tags: suggestion.tags,
                }
            })
            .collect();

        let mut stats = AnalyzeStats {
            total: suggestions.len() as u64,
            ..Default::default()
        };
        for s in &suggestions {
            stats.needs_rename += u64::from(s.needs_rename);
            stats.needs_category_update += u64::from(s.needs_category_update);
            *stats
                .by_category
                .entry(s.suggested_category.clone())
                .or_default() += 1;
        }

        let suggestions = if changes_only {
            suggestions
                .into_iter()
                .filter(NameSuggestion::needs_change)
                .take(PREVIEW_LIMIT)
                .collect()
        } else {
            suggestions
        };

        Ok(AnalyzeReport { stats, suggestions })
    }

    /// File the selected images under their suggested category, add the
    /// suggested tags to the existing ones, and rename those not yet in
    /// house style.
    pub fn analyze_apply(
        &self,
        selection: &AnalyzeSelection,
    ) -> Result<AnalyzeApplyReport, StoreError> {
        let restrict = !selection.apply_all && !selection.ids.is_empty();
        let mut report = AnalyzeApplyReport::default();

        for record in self.images()? {
            if restrict && !selection.ids.contains(&record.id) {
                continue;
            }

            let suggestion = suggest(&record.original_name);
            let mut tags = record.tags.clone();
            for tag in suggestion.tags {
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
            let curated = CURATED_PREFIXES
                .iter()
                .any(|p| record.original_name.starts_with(p));
            let rename = (suggestion.name != record.original_name && !curated)
                .then_some(suggestion.name);

            let update = MediaUpdate {
                original_name: rename,
                category: Patch::Value(suggestion.category.to_string()),
                tags: Some(tags),
                ..Default::default()
            };

            match self.update_metadata(&record.id, &update) {
                Ok(updated) => {
                    report.updated += 1;
                    if report.results.len() < APPLIED_RESULT_LIMIT {
                        report.results.push(AppliedSuggestion {
                            id: updated.id,
                            old_name: record.original_name,
                            new_name: updated.original_name,
                            category: suggestion.category.to_string(),
                            tags: updated.tags,
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!(media_id = %record.id, error = %e, "Failed to apply name suggestion");
                    report.failed.push(ItemFailure {
                        id: record.id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            updated = report.updated,
            failed = report.failed.len(),
            "Applied name suggestions"
        );
        Ok(report)
    }
}
