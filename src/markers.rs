//! Marker construction helpers: icon URL normalisation, built-in default
//! icons and the [`MarkerSpec`]s handed to the rendering surface.

use crate::config::{BUILDING_MARKER_COLOR, ICON_ASSET_DOMAIN, MARKER_SIZE, POPUP_OFFSET};
use crate::surface::{MarkerKind, MarkerSpec, PopupSpec};
use crate::types::{Building, Poi, PoiCategory};

// ---------------------------------------------------------------------------
// Default icons
// ---------------------------------------------------------------------------

pub const DEFAULT_POI_ICON_SVG: &str = r##"<svg width="32" height="32" viewBox="0 0 32 32" fill="none" xmlns="http://www.w3.org/2000/svg"><path d="M16 2C11.0294 2 7 6.02944 7 11C7 17.25 16 30 16 30C16 30 25 17.25 25 11C25 6.02944 20.9706 2 16 2Z" fill="#3B82F6" stroke="#FFFFFF" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"/><circle cx="16" cy="11" r="3" fill="#FFFFFF"/></svg>"##;

pub const DEFAULT_POI_SELECTED_ICON_SVG: &str = r##"<svg width="32" height="32" viewBox="0 0 32 32" fill="none" xmlns="http://www.w3.org/2000/svg"><path d="M16 1C10.4772 1 6 5.47715 6 11C6 17.9 16 31 16 31C16 31 26 17.9 26 11C26 5.47715 21.5228 1 16 1Z" fill="#1D4ED8" stroke="#FFFFFF" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"/><circle cx="16" cy="11" r="4" fill="#FFFFFF"/></svg>"##;

/// Normal + selected icon pair for one marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerIcons {
    pub icon_url: String,
    pub selected_icon_url: String,
}

impl MarkerIcons {
    pub fn default_pin() -> Self {
        Self {
            icon_url: svg_to_data_uri(DEFAULT_POI_ICON_SVG),
            selected_icon_url: svg_to_data_uri(DEFAULT_POI_SELECTED_ICON_SVG),
        }
    }

    /// Category icons when the category resolves, the default pin otherwise.
    pub fn for_category(category: Option<&PoiCategory>) -> Self {
        match category {
            Some(c) => Self {
                icon_url: normalize_icon_url(&c.icon_url),
                selected_icon_url: normalize_icon_url(&c.selected_icon_url),
            },
            None => Self::default_pin(),
        }
    }
}

// ---------------------------------------------------------------------------
// URL helpers
// ---------------------------------------------------------------------------

/// Absolute URLs pass through; paths resolve against [`ICON_ASSET_DOMAIN`].
pub fn normalize_icon_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") || url.starts_with("data:") {
        return url.to_string();
    }
    if url.starts_with('/') {
        return format!("{ICON_ASSET_DOMAIN}{url}");
    }
    format!("{ICON_ASSET_DOMAIN}/{url}")
}

/// `data:image/svg+xml,` URI using `encodeURIComponent` rules, with quotes
/// escaped so the URI can sit inside a CSS `url(...)`.
pub fn svg_to_data_uri(svg: &str) -> String {
    let mut out = String::with_capacity(svg.len() * 2 + 19);
    out.push_str("data:image/svg+xml,");
    for b in svg.bytes() {
        match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'('
            | b')' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Marker specs
// ---------------------------------------------------------------------------

pub fn popup_text(poi: &Poi) -> String {
    format!("{} {}", poi.name, poi.info)
}

pub fn poi_marker(poi: &Poi, icons: &MarkerIcons) -> MarkerSpec {
    MarkerSpec {
        position: poi.location,
        kind: MarkerKind::Icon {
            icon_url: icons.icon_url.clone(),
            size: MARKER_SIZE,
        },
        popup: Some(PopupSpec {
            text: popup_text(poi),
            offset: POPUP_OFFSET,
        }),
    }
}

pub fn building_marker(building: &Building) -> MarkerSpec {
    MarkerSpec {
        position: building.location,
        kind: MarkerKind::Pin {
            color: BUILDING_MARKER_COLOR.into(),
        },
        popup: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LatLng;

    #[test]
    fn absolute_urls_pass_through() {
        for url in [
            "http://example.com/icon.png",
            "https://example.com/icon.png",
            "data:image/svg+xml,%3Csvg%3E",
        ] {
            assert_eq!(normalize_icon_url(url), url);
        }
    }

    #[test]
    fn rooted_path_gets_domain() {
        assert_eq!(
            normalize_icon_url("/path/to/icon.png"),
            format!("{ICON_ASSET_DOMAIN}/path/to/icon.png")
        );
    }

    #[test]
    fn relative_path_gets_domain_and_slash() {
        assert_eq!(
            normalize_icon_url("icon.png"),
            format!("{ICON_ASSET_DOMAIN}/icon.png")
        );
    }

    #[test]
    fn data_uri_escapes_markup_and_quotes() {
        let uri = svg_to_data_uri(r#"<svg a="1" b='2'/>"#);
        assert_eq!(
            uri,
            "data:image/svg+xml,%3Csvg%20a%3D%221%22%20b%3D%272%27%2F%3E"
        );
    }

    #[test]
    fn default_icons_are_distinct_svg_uris() {
        let icons = MarkerIcons::default_pin();
        assert!(icons.icon_url.starts_with("data:image/svg+xml,%3Csvg"));
        assert!(icons.selected_icon_url.starts_with("data:image/svg+xml,%3Csvg"));
        assert_ne!(icons.icon_url, icons.selected_icon_url);
    }

    #[test]
    fn unresolved_category_falls_back_to_default_pin() {
        assert_eq!(MarkerIcons::for_category(None), MarkerIcons::default_pin());
    }

    #[test]
    fn category_icons_are_normalised() {
        let cat = PoiCategory {
            id: 1,
            name: Some("access".into()),
            icon_url: "/icons/access.png".into(),
            selected_icon_url: "/icons/accessSelected.png".into(),
            visible: true,
        };
        let icons = MarkerIcons::for_category(Some(&cat));
        assert_eq!(icons.icon_url, format!("{ICON_ASSET_DOMAIN}/icons/access.png"));
        assert_eq!(
            icons.selected_icon_url,
            format!("{ICON_ASSET_DOMAIN}/icons/accessSelected.png")
        );
    }

    #[test]
    fn poi_marker_carries_popup_text() {
        let poi = Poi {
            id: 2,
            name: "Coffee Shop".into(),
            info: "Open 8-18".into(),
            floor_id: 1,
            category_id: None,
            category_name: None,
            location: LatLng::new(40.4168, -3.7037),
        };
        let spec = poi_marker(&poi, &MarkerIcons::default_pin());
        assert_eq!(spec.position, poi.location);
        let popup = spec.popup.expect("popup");
        assert_eq!(popup.text, "Coffee Shop Open 8-18");
        assert_eq!(popup.offset, POPUP_OFFSET);
    }
}
