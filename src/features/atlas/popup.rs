use ammonia::clean_text;

use crate::features::districts::dtos::DistrictMapPointDto;

/// DOM event fired by popup buttons, `detail` carries the district slug
pub const DISTRICT_SELECT_EVENT: &str = "districtSelect";

/// Popup markup for a district marker.
///
/// The button dispatches `districtSelect` on `window` instead of navigating,
/// so the map controller decides what opening a district means.
pub fn popup_html(point: &DistrictMapPointDto) -> String {
    let mut html = String::from(r#"<div class="district-popup">"#);

    if let Some(image) = point.header_image.as_deref() {
        html.push_str(&format!(
            r#"<img src="{}" alt="{}" loading="lazy"/>"#,
            clean_text(image),
            clean_text(&point.name)
        ));
    }

    html.push_str(&format!("<h3>{}</h3>", clean_text(&point.name)));

    if let Some(population) = point.population {
        html.push_str(&format!("<p>Population: {}</p>", population));
    }
    html.push_str(&format!(
        "<p>Gram panchayats: {}</p>",
        point.gram_panchayat_count
    ));

    let detail = serde_json::to_string(&point.slug).unwrap_or_else(|_| "\"\"".to_string());
    html.push_str(&format!(
        r#"<button type="button" onclick="window.dispatchEvent(new CustomEvent('{}', {{ detail: {} }}))">View details</button>"#,
        DISTRICT_SELECT_EVENT,
        clean_text(&detail)
    ));

    html.push_str("</div>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::Coordinates;
    use uuid::Uuid;

    fn point(name: &str) -> DistrictMapPointDto {
        DistrictMapPointDto {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: "cooch-behar".to_string(),
            coordinates: Coordinates {
                lat: 26.32,
                lng: 89.45,
            },
            header_image: None,
            population: Some(2_819_086),
            gram_panchayat_count: 128,
        }
    }

    #[test]
    fn test_popup_dispatches_select_event_with_slug() {
        let html = popup_html(&point("Cooch Behar"));
        assert!(html.contains(
            "new CustomEvent('districtSelect', { detail: &quot;cooch-behar&quot; })"
        ));
        assert!(html.contains("<h3>Cooch&#32;Behar</h3>"));
        assert!(html.contains("Gram panchayats: 128"));
    }

    #[test]
    fn test_popup_escapes_names() {
        let html = popup_html(&point("<script>alert(1)</script>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_popup_image_attributes_cannot_break_out() {
        let mut p = point("Jhargram\" onload=\"alert(1)");
        p.header_image = Some("https://images.test/a.jpg\" onerror=\"alert(1)".to_string());

        let html = popup_html(&p);

        assert!(!html.contains("\" onload"));
        assert!(!html.contains("\" onerror"));
        assert!(html.contains("&quot;"));
    }
}
