use std::collections::HashMap;

use serde::Deserialize;

/// One named administrative area, identified on the raster by its canonical
/// flat fill color. Ids are assigned in config-document order starting at 1
/// and are stable for the lifetime of the loaded map.
#[derive(Clone, Debug)]
pub struct Region {
    pub id: u32,
    pub label: String,
    /// Canonical RGB as it appears in the original raster.
    pub color: [u8; 3],
    /// Opaque path data carried through from the config. Unused by the
    /// pixel pipeline; kept so exports can round-trip it later.
    pub paths: serde_json::Value,
}

/// Region-configuration document:
/// `{ "groups": { "#rrggbb": { "label": "...", "paths": [...] }, ... } }`
///
/// `serde_json`'s preserve_order feature keeps `groups` in document order,
/// which is what makes the sequential id assignment deterministic.
#[derive(Deserialize)]
struct ConfigDocument {
    groups: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct GroupDef {
    label: String,
    #[serde(default)]
    paths: serde_json::Value,
}

/// Ordered set of regions plus the canonical-color → region index.
/// Rebuilt from scratch on every map load; never updated incrementally.
pub struct RegionRegistry {
    regions: Vec<Region>,
    /// Canonical color → index into `regions`.
    by_color: HashMap<[u8; 3], usize>,
}

impl RegionRegistry {
    /// Parse a config document into an ordered registry.
    ///
    /// Region ids are `1..=groups.len()` in document order — a public
    /// contract the UI (legend, tooltips) and tests rely on.
    pub fn parse(config_text: &str) -> Result<Self, String> {
        let doc: ConfigDocument = serde_json::from_str(config_text)
            .map_err(|e| format!("invalid config document: {}", e))?;

        let mut regions = Vec::with_capacity(doc.groups.len());
        let mut by_color = HashMap::with_capacity(doc.groups.len());

        for (hex, value) in &doc.groups {
            let color = parse_hex_color(hex)
                .ok_or_else(|| format!("group key '{}' is not a #rrggbb color", hex))?;
            let group: GroupDef = serde_json::from_value(value.clone())
                .map_err(|e| format!("group '{}': {}", hex, e))?;

            let id = regions.len() as u32 + 1;
            if by_color.insert(color, regions.len()).is_some() {
                return Err(format!("duplicate group color '{}'", hex));
            }
            regions.push(Region {
                id,
                label: group.label,
                color,
                paths: group.paths,
            });
        }

        Ok(Self { regions, by_color })
    }

    /// Resolve a sampled pixel color to its region, if any. Colors outside
    /// the configured palette (background, compression artifacts) yield None.
    pub fn region_by_color(&self, color: [u8; 3]) -> Option<&Region> {
        self.by_color.get(&color).map(|&i| &self.regions[i])
    }

    pub fn region(&self, id: u32) -> Option<&Region> {
        // Ids are 1-based and contiguous, so this is a direct index.
        self.regions.get(id.checked_sub(1)? as usize)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }
}

/// Parse `#rrggbb` (leading '#' optional, case-insensitive) into RGB bytes.
pub fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
    let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
    let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
    Some([r, g, b])
}

/// Format RGB bytes as `#rrggbb` (for logs and the legend).
pub fn format_hex_color(color: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_GROUPS: &str = r##"{
        "groups": {
            "#ff0000": { "label": "A", "paths": [] },
            "#00ff00": { "label": "B", "paths": [] }
        }
    }"##;

    #[test]
    fn parses_regions_in_document_order() {
        let reg = RegionRegistry::parse(TWO_GROUPS).unwrap();
        assert_eq!(reg.len(), 2);

        let ids: Vec<u32> = reg.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);

        let a = reg.region(1).unwrap();
        assert_eq!(a.label, "A");
        assert_eq!(a.color, [255, 0, 0]);
        let b = reg.region(2).unwrap();
        assert_eq!(b.label, "B");
        assert_eq!(b.color, [0, 255, 0]);
    }

    #[test]
    fn document_order_wins_over_key_order() {
        // Keys deliberately in reverse lexicographic order: the *first*
        // group in the document must still get id 1.
        let text = r##"{
            "groups": {
                "#ffffee": { "label": "Last-alphabetical first", "paths": [] },
                "#000001": { "label": "First-alphabetical second", "paths": [] }
            }
        }"##;
        let reg = RegionRegistry::parse(text).unwrap();
        assert_eq!(reg.region(1).unwrap().color, [0xff, 0xff, 0xee]);
        assert_eq!(reg.region(2).unwrap().color, [0x00, 0x00, 0x01]);
    }

    #[test]
    fn color_index_resolves_and_rejects() {
        let reg = RegionRegistry::parse(TWO_GROUPS).unwrap();
        assert_eq!(reg.region_by_color([255, 0, 0]).unwrap().id, 1);
        assert!(reg.region_by_color([1, 2, 3]).is_none());
        assert!(reg.region_by_color([255, 255, 255]).is_none());
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(RegionRegistry::parse("not json").is_err());
        assert!(RegionRegistry::parse(r#"{"no_groups": {}}"#).is_err());
        assert!(RegionRegistry::parse(r#"{"groups": {"red": {"label": "x"}}}"#).is_err());
        assert!(RegionRegistry::parse(r##"{"groups": {"#ff0000": {"nolabel": 1}}}"##).is_err());
    }

    #[test]
    fn rejects_duplicate_colors() {
        let text = r##"{
            "groups": {
                "#aabbcc": { "label": "one", "paths": [] },
                "#AABBCC": { "label": "two", "paths": [] }
            }
        }"##;
        assert!(RegionRegistry::parse(text).is_err());
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(parse_hex_color("#ff8000"), Some([255, 128, 0]));
        assert_eq!(parse_hex_color("FF8000"), Some([255, 128, 0]));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
        assert_eq!(format_hex_color([255, 128, 0]), "#ff8000");
    }

    #[test]
    fn region_id_zero_is_never_valid() {
        let reg = RegionRegistry::parse(TWO_GROUPS).unwrap();
        assert!(reg.region(0).is_none());
        assert!(reg.region(3).is_none());
    }
}
