use crate::settings::PdfSettings;
use anyhow::{anyhow, bail};
use printpdf::{Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Pt, RawImage, XObjectTransform};

// Guards against a float sliver producing an extra empty page.
const TILE_EPSILON_MM: f64 = 1e-6;
// At 72 dpi one image pixel is one point before scaling.
const IMAGE_DPI: f32 = 72.0;
const DOCUMENT_TITLE: &str = "Result Card";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePlacement {
    pub index: usize,
    /// Image top relative to the page top, in mm. Zero on the first page,
    /// one tile further up on every following page.
    pub offset_mm: f64,
}

/// Tiles an image of `image_height_mm` onto pages at `tile_height_mm` steps.
pub fn plan_pages(image_height_mm: f64, tile_height_mm: f64) -> Vec<PagePlacement> {
    let count = if image_height_mm > 0.0 && tile_height_mm > 0.0 {
        ((image_height_mm - TILE_EPSILON_MM) / tile_height_mm).ceil().max(1.0) as usize
    } else {
        1
    };
    (0..count)
        .map(|index| PagePlacement {
            index,
            offset_mm: -(index as f64) * tile_height_mm,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct EncodedPdf {
    pub bytes: Vec<u8>,
    pub pages: usize,
}

fn pt(mm: f64) -> Pt {
    Pt::from(Mm(mm as f32))
}

/// Decodes the snapshot, scales it to the page width and draws it once per tile.
pub fn encode(snapshot: &[u8], geometry: &PdfSettings) -> anyhow::Result<EncodedPdf> {
    let mut warnings = Vec::new();
    let image = RawImage::decode_from_bytes(snapshot, &mut warnings)
        .map_err(|e| anyhow!("invalid report snapshot: {e}"))?;
    if image.width == 0 || image.height == 0 {
        bail!("report snapshot has zero size");
    }

    let image_height_mm =
        image.height as f64 * geometry.page_width_mm / image.width as f64;
    let placements = plan_pages(image_height_mm, geometry.tile_height_mm);

    let page_h = pt(geometry.page_height_mm);
    let image_h = pt(image_height_mm);
    let scale = pt(geometry.page_width_mm).0 / image.width as f32;

    let mut doc = PdfDocument::new(DOCUMENT_TITLE);
    let image_id = doc.add_image(&image);
    let pages: Vec<PdfPage> = placements
        .iter()
        .map(|p| {
            // PDF user space grows upwards from the page bottom.
            let y = page_h.0 - image_h.0 - pt(p.offset_mm).0;
            let ops = vec![Op::UseXobject {
                id: image_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(y)),
                    scale_x: Some(scale),
                    scale_y: Some(scale),
                    dpi: Some(IMAGE_DPI),
                    ..Default::default()
                },
            }];
            PdfPage::new(
                Mm(geometry.page_width_mm as f32),
                Mm(geometry.page_height_mm as f32),
                ops,
            )
        })
        .collect();

    let bytes = doc
        .with_pages(pages)
        .save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        tracing::debug!(count = warnings.len(), "pdf encoder warnings: {:?}", warnings);
    }

    let pages = placements.len();
    tracing::debug!(
        width_px = image.width,
        height_px = image.height,
        image_height_mm,
        pages,
        "tiled report snapshot"
    );
    Ok(EncodedPdf { bytes, pages })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_image_fits_one_page() {
        let pages = plan_pages(200.0, 295.0);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].offset_mm, 0.0);
    }

    #[test]
    fn exact_multiple_adds_no_blank_page() {
        assert_eq!(plan_pages(295.0, 295.0).len(), 1);
        assert_eq!(plan_pages(590.0, 295.0).len(), 2);
    }

    #[test]
    fn tall_image_tiles_at_fixed_steps() {
        let pages = plan_pages(600.0, 295.0);
        assert_eq!(pages.len(), 3);
        let offsets: Vec<f64> = pages.iter().map(|p| p.offset_mm).collect();
        assert_eq!(offsets, vec![0.0, -295.0, -590.0]);
    }

    #[test]
    fn degenerate_sizes_still_produce_a_page() {
        assert_eq!(plan_pages(0.0, 295.0).len(), 1);
        assert_eq!(plan_pages(100.0, 0.0).len(), 1);
    }

    #[test]
    fn rejects_bytes_that_are_not_an_image() {
        let geometry = crate::settings::Settings::default().pdf;
        let e = encode(b"not an image at all", &geometry).unwrap_err();
        assert!(format!("{e:#}").contains("invalid report snapshot"));
    }
}
