use slotdeck_core::{DeckExtractor, Error, Slot};
use slotdeck_pptx::PptxReader;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::ZipWriter;

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const SLIDE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const IMAGE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const LAYOUT_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const MASTER_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const CAPTION_IDX: usize = 20;
const PT: i64 = 12_700;

/// Template photo positions in points: main on the left, 2x2 grid on the right.
const LAYOUT: [(i64, i64, i64, i64); 5] = [
    (20, 20, 300, 400),
    (340, 20, 150, 190),
    (500, 20, 150, 190),
    (340, 230, 150, 190),
    (500, 230, 150, 190),
];

struct TestSlide {
    caption: &'static str,
    photos: usize,
}

/// How the template geometry is stored.
#[derive(Clone, Copy, PartialEq)]
enum Template {
    /// Every shape carries its own `a:xfrm`.
    Positioned,
    /// Photos and caption are placeholders positioned by the slide layout.
    Placeholders,
}

fn picture(id: usize, rel: &str, (x, y, w, h): (i64, i64, i64, i64)) -> String {
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture {id}"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{rel}"/></p:blipFill><p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm></p:spPr></p:pic>"#,
        x * PT,
        y * PT,
        w * PT,
        h * PT
    )
}

fn caption(text: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="50" name="TextBox 49"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
        20 * PT,
        440 * PT,
        300 * PT,
        30 * PT,
        text
    )
}

fn xfrm((x, y, w, h): (i64, i64, i64, i64)) -> String {
    format!(
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        x * PT,
        y * PT,
        w * PT,
        h * PT
    )
}

fn picture_placeholder(id: usize, idx: usize, rel: &str) -> String {
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture Placeholder {id}"/><p:cNvPicPr/><p:nvPr><p:ph type="pic" idx="{idx}"/></p:nvPr></p:nvPicPr><p:blipFill><a:blip r:embed="{rel}"/></p:blipFill><p:spPr/></p:pic>"#
    )
}

fn caption_placeholder(text: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="50" name="Text Placeholder 49"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="{CAPTION_IDX}"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#
    )
}

/// Layout holding the template geometry for photo placeholders 10..=14 and
/// a caption placeholder positioned only by the master.
fn layout_xml() -> String {
    let mut body = String::new();
    for (i, &geometry) in LAYOUT.iter().enumerate() {
        body.push_str(&format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="Picture Placeholder"/><p:cNvSpPr/><p:nvPr><p:ph type="pic" sz="quarter" idx="{}"/></p:nvPr></p:nvSpPr><p:spPr>{}</p:spPr></p:sp>"#,
            i + 2,
            10 + i,
            xfrm(geometry)
        ));
    }
    body.push_str(&format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="20" name="Text Placeholder"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="{CAPTION_IDX}"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>"#
    ));
    format!(
        r#"<?xml version="1.0"?><p:sldLayout {}><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sldLayout>"#,
        NS, body
    )
}

fn master_xml() -> String {
    format!(
        r#"<?xml version="1.0"?><p:sldMaster {}><p:cSld><p:spTree><p:sp><p:nvSpPr><p:cNvPr id="2" name="Text Placeholder"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr>{}</p:spPr></p:sp></p:spTree></p:cSld></p:sldMaster>"#,
        NS,
        xfrm((20, 440, 300, 30))
    )
}

fn rels(entries: &[(String, &str, String)]) -> String {
    let body: String = entries
        .iter()
        .map(|(id, ty, target)| format!(r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#, id, ty, target))
        .collect();
    format!(
        r#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        body
    )
}

/// Write a deck where every slide follows the template, except that
/// `photos` < 5 replaces the missing photos with a small logo.
fn write_deck(path: &Path, slides: &[TestSlide], template: Template) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = FileOptions::default();

    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="jpeg" ContentType="image/jpeg"/><Default Extension="png" ContentType="image/png"/></Types>"#,
    )
    .unwrap();

    let pres_rels: Vec<(String, &str, String)> = (1..=slides.len())
        .map(|n| (format!("rId{}", n), SLIDE_REL, format!("slides/slide{}.xml", n)))
        .collect();
    zip.start_file("ppt/_rels/presentation.xml.rels", options).unwrap();
    zip.write_all(rels(&pres_rels).as_bytes()).unwrap();

    for (idx, slide) in slides.iter().enumerate() {
        let n = idx + 1;
        let mut body = String::new();
        let mut slide_rels = Vec::new();

        for (i, &geometry) in LAYOUT.iter().enumerate() {
            let rel_id = format!("rId{}", i + 2);
            let media = format!("../media/image{}_{}.jpeg", n, i);
            let geometry = if i < slide.photos {
                geometry
            } else {
                (geometry.0, geometry.1, 40, 40)
            };
            if template == Template::Placeholders && i < slide.photos {
                body.push_str(&picture_placeholder(i + 2, 10 + i, &rel_id));
            } else {
                body.push_str(&picture(i + 2, &rel_id, geometry));
            }
            slide_rels.push((rel_id, IMAGE_REL, media));
        }
        match template {
            Template::Positioned => body.push_str(&caption(slide.caption)),
            Template::Placeholders => {
                body.push_str(&caption_placeholder(slide.caption));
                slide_rels.push((
                    "rId1".to_string(),
                    LAYOUT_REL,
                    "../slideLayouts/slideLayout1.xml".to_string(),
                ));
            }
        }

        zip.start_file(format!("ppt/slides/slide{}.xml", n), options).unwrap();
        zip.write_all(
            format!(
                r#"<?xml version="1.0"?><p:sld {}><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>"#,
                NS, body
            )
            .as_bytes(),
        )
        .unwrap();

        zip.start_file(format!("ppt/slides/_rels/slide{}.xml.rels", n), options).unwrap();
        zip.write_all(rels(&slide_rels).as_bytes()).unwrap();

        for i in 0..LAYOUT.len() {
            zip.start_file(format!("ppt/media/image{}_{}.jpeg", n, i), options).unwrap();
            zip.write_all(format!("jpeg {} {}", n, i).as_bytes()).unwrap();
        }
    }

    if template == Template::Placeholders {
        zip.start_file("ppt/slideLayouts/slideLayout1.xml", options).unwrap();
        zip.write_all(layout_xml().as_bytes()).unwrap();
        zip.start_file("ppt/slideLayouts/_rels/slideLayout1.xml.rels", options).unwrap();
        zip.write_all(
            rels(&[(
                "rId1".to_string(),
                MASTER_REL,
                "../slideMasters/slideMaster1.xml".to_string(),
            )])
            .as_bytes(),
        )
        .unwrap();
        zip.start_file("ppt/slideMasters/slideMaster1.xml", options).unwrap();
        zip.write_all(master_xml().as_bytes()).unwrap();
    }

    zip.finish().unwrap();
}

fn files_in(dir: PathBuf) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_extracts_deck_and_skips_short_slide() {
    let tmp = TempDir::new().unwrap();
    let deck_path = tmp.path().join("남자모델.pptx");
    write_deck(
        &deck_path,
        &[
            TestSlide {
                caption: "지민 (97) 175cm",
                photos: 5,
            },
            TestSlide {
                caption: "윤호 (95) 180cm",
                photos: 4,
            },
            TestSlide {
                caption: "VINCENT 1997's 179cm 프랑스",
                photos: 5,
            },
        ],
        Template::Positioned,
    );
    let out = tmp.path().join("output");

    let summary = DeckExtractor::new(PptxReader::new())
        .extract(&deck_path, &out)
        .unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.extracted, 2);
    assert_eq!(summary.skipped, vec![2]);

    let deck_dir = out.join("남자모델");
    assert_eq!(
        files_in(deck_dir.join("MAIN")),
        vec!["VINCENT(97)179cm_MAIN.jpg", "지민(97)175cm_MAIN.jpg"]
    );

    // Slot assignment follows the layout: image index i lands in slot i.
    for (i, slot) in Slot::ALL.iter().enumerate() {
        let bytes = fs::read(
            deck_dir
                .join(slot.as_str())
                .join(format!("지민(97)175cm_{}.jpg", slot)),
        )
        .unwrap();
        assert_eq!(bytes, format!("jpeg 1 {}", i).into_bytes());
    }
}

#[test]
fn test_extracts_deck_built_on_layout_placeholders() {
    let tmp = TempDir::new().unwrap();
    let deck_path = tmp.path().join("placeholders.pptx");
    write_deck(
        &deck_path,
        &[
            TestSlide {
                caption: "지민 (97) 175cm",
                photos: 5,
            },
            TestSlide {
                caption: "윤호 (95) 180cm",
                photos: 4,
            },
        ],
        Template::Placeholders,
    );
    let out = tmp.path().join("output");

    let summary = DeckExtractor::new(PptxReader::new())
        .extract(&deck_path, &out)
        .unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.extracted, 1);
    assert_eq!(summary.skipped, vec![2]);

    let deck_dir = out.join("placeholders");
    for (i, slot) in Slot::ALL.iter().enumerate() {
        let bytes = fs::read(
            deck_dir
                .join(slot.as_str())
                .join(format!("지민(97)175cm_{}.jpg", slot)),
        )
        .unwrap();
        assert_eq!(bytes, format!("jpeg 1 {}", i).into_bytes());
    }
}

#[test]
fn test_missing_deck_is_reported() {
    let tmp = TempDir::new().unwrap();
    let result = DeckExtractor::new(PptxReader::new()).extract(&tmp.path().join("nope.pptx"), tmp.path());
    assert!(matches!(result, Err(Error::DeckNotFound(_))));
}

#[test]
fn test_non_pptx_file_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("notes.txt");
    fs::write(&path, "hello").unwrap();

    let result = DeckExtractor::new(PptxReader::new()).extract(&path, &tmp.path().join("out"));
    assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
}
