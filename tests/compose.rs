mod common;

use rayon::prelude::*;

use visit_report::{
    Classification, DirectorySink, DrawOp, EmailDraft, Error, ImageAsset, ImagePosition,
    PageGeometry, PageLayout, ReportConfig, ReportSink, ValidationError, compose_report,
    generate_report,
};

fn images(page: &PageLayout) -> Vec<(f32, f32, f32, f32)> {
    page.images()
        .filter_map(|op| match op {
            DrawOp::Image {
                x,
                y,
                width,
                height,
                ..
            } => Some((*x, *y, *width, *height)),
            _ => None,
        })
        .collect()
}

fn text_color(page: &PageLayout, needle: &str) -> Option<[u8; 3]> {
    page.ops().iter().find_map(|op| match op {
        DrawOp::Text { text, color, .. } if text.contains(needle) => Some(*color),
        _ => None,
    })
}

fn page_of(pages: &[PageLayout], needle: &str) -> Option<usize> {
    pages.iter().position(|p| p.contains_text(needle))
}

fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

/// Heights of the grey information frames on a page.
fn info_frames(page: &PageLayout) -> Vec<f32> {
    page.ops()
        .iter()
        .filter_map(|op| match op {
            DrawOp::FillRect { height, color, .. } if *color == [240, 240, 240] => Some(*height),
            _ => None,
        })
        .collect()
}

/// Every op except the header and footer chrome ends above the bottom limit.
fn assert_within_bottom(pages: &[PageLayout], g: &PageGeometry) {
    let bottom = g.content_bottom() + 0.01;
    for (i, page) in pages.iter().enumerate() {
        for op in page.ops() {
            let end = match op {
                DrawOp::FillRect { y, height, .. }
                | DrawOp::StrokeRect { y, height, .. }
                | DrawOp::Image { y, height, .. } => y + height,
                DrawOp::Text { text, .. } if text.starts_with("Page ") => continue,
                DrawOp::Text { y, .. } => *y,
            };
            assert!(end <= bottom, "page {}: {op:?} ends at {end}", i + 1);
        }
    }
}

fn long_text(tag: &str, words: usize) -> String {
    let body = vec!["constat"; words].join(" ");
    format!("DEBUT{tag} {body} FIN{tag}")
}

#[test]
fn single_positive_observation_gives_three_pages() {
    common::init_logging();
    let report = compose_report(&common::sample_input(), &ReportConfig::default()).unwrap();

    assert_eq!(report.page_count(), 3);
    let pages = report.pages();

    assert!(pages[0].contains_text("14/03/2024"));
    assert!(pages[0].contains_text("Camille Martin"));
    assert!(pages[0].contains_text("Redacteur:"));
    assert!(pages[0].contains_text("09:30"));
    assert!(pages[0].contains_text("10:45"));
    assert!(pages[0].contains_text("B1234"));
    assert!(pages[0].contains_text("Le president du conseil syndical"));
    assert_eq!(images(&pages[0]).len(), 1);

    assert!(pages[1].contains_text("OBSERVATIONS"));
    assert_eq!(
        text_color(&pages[1], "Observation 1 - Positive"),
        Some([0, 150, 0])
    );
    assert!(pages[1].contains_text("Parties communes propres"));
    assert!(!pages[1].contains_text("Photos :"));
    assert_eq!(images(&pages[1]).len(), 0);

    assert!(pages[2].contains_text("VALIDATION DU RAPPORT"));
    assert!(pages[2].contains_text("Gestionnaire de copropriete"));
    assert_eq!(images(&pages[2]).len(), 1);
}

#[test]
fn every_page_has_header_and_numbered_footer() {
    let report = compose_report(&common::sample_input(), &ReportConfig::default()).unwrap();
    for (i, page) in report.pages().iter().enumerate() {
        assert!(page.contains_text("ORPI Adimmo"));
        assert!(page.contains_text("RAPPORT DE VISITE"));
        assert!(page.contains_text(&format!("Page {}/3", i + 1)));
    }
}

#[test]
fn output_is_a_pdf_document() {
    let input = common::sample_input();
    let report = compose_report(&input, &ReportConfig::default()).unwrap();
    let bytes = report.bytes();
    assert!(bytes.starts_with(b"%PDF-"));
    assert!(count(bytes, b"/Helvetica-Bold") >= 1);
    assert_eq!(count(bytes, b"/DCTDecode"), 1);
    assert!(count(bytes, b"/SMask") >= 1);
    assert_eq!(report.file_name(), "rapport_visite_20240314.pdf");
}

#[test]
fn zero_observations_still_produce_three_pages() {
    let mut input = common::sample_input();
    input.observations.clear();
    input.main_photo = None;
    let report = compose_report(&input, &ReportConfig::default()).unwrap();

    assert_eq!(report.page_count(), 3);
    let pages = report.pages();
    assert!(pages[1].contains_text("OBSERVATIONS"));
    assert!(!pages[1].contains_text("Observation 1"));
    assert_eq!(images(&pages[0]).len(), 0);
    assert!(pages[2].contains_text("VALIDATION DU RAPPORT"));
}

#[test]
fn missing_signature_is_rejected() {
    let mut input = common::sample_input();
    input.signature = None;
    let err = compose_report(&input, &ReportConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::MissingSignature)
    ));
    assert!(err.to_string().contains("signature"));

    input.signature = Some(ImageAsset::new(Vec::new()));
    let err = compose_report(&input, &ReportConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::MissingSignature)
    ));
}

#[test]
fn required_visit_fields_are_validated() {
    let mut input = common::sample_input();
    input.visit.address = "   ".into();
    assert!(matches!(
        compose_report(&input, &ReportConfig::default()),
        Err(Error::Validation(ValidationError::MissingAddress))
    ));

    let mut input = common::sample_input();
    input.visit.building_code = String::new();
    assert!(matches!(
        compose_report(&input, &ReportConfig::default()),
        Err(Error::Validation(ValidationError::MissingBuildingCode))
    ));

    let mut input = common::sample_input();
    input.observations[0].description = "\n ".into();
    assert!(matches!(
        compose_report(&input, &ReportConfig::default()),
        Err(Error::Validation(ValidationError::EmptyDescription { observation: 0 }))
    ));
}

#[test]
fn more_than_three_photos_is_rejected() {
    let mut input = common::sample_input();
    input.observations[0].photos = vec![ImageAsset::new(common::jpeg(40, 30)); 4];
    let err = compose_report(&input, &ReportConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::TooManyPhotos {
            observation: 0,
            count: 4
        })
    ));
}

#[test]
fn bad_photo_error_names_its_position() {
    let mut input = common::sample_input();
    let mut second = common::observation(Classification::NeedsImprovement, "Fissure en facade");
    second.photos = vec![ImageAsset::new(b"not an image".to_vec())];
    input.observations.push(second);

    let err = compose_report(&input, &ReportConfig::default()).unwrap_err();
    match &err {
        Error::ImageDecode { position, .. } => assert_eq!(
            *position,
            ImagePosition::Observation {
                observation: 1,
                photo: 0
            }
        ),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("observation 2, photo 1"));
}

#[test]
fn bad_main_photo_is_reported() {
    let mut input = common::sample_input();
    input.main_photo = Some(ImageAsset::new(b"\x89PNG broken".to_vec()));
    let err = compose_report(&input, &ReportConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::ImageDecode {
            position: ImagePosition::MainPhoto,
            ..
        }
    ));
}

#[test]
fn needs_improvement_label_is_red_with_action() {
    let mut input = common::sample_input();
    let mut obs = common::observation(Classification::NeedsImprovement, "Eclairage defaillant");
    obs.action = Some("Remplacer les ampoules du hall".into());
    input.observations.push(obs);

    let report = compose_report(&input, &ReportConfig::default()).unwrap();
    let page = &report.pages()[1];
    assert_eq!(
        text_color(page, "Observation 2 - A ameliorer"),
        Some([200, 0, 0])
    );
    assert!(page.contains_text("Action a mener :"));
    assert!(page.contains_text("Remplacer les ampoules du hall"));
}

#[test]
fn blank_action_is_omitted() {
    let mut input = common::sample_input();
    input.observations[0].action = Some("  ".into());
    let report = compose_report(&input, &ReportConfig::default()).unwrap();
    assert!(!report.pages()[1].contains_text("Action a mener"));
}

#[test]
fn observation_text_never_splits_across_pages() {
    let mut input = common::sample_input();
    input.observations = (1..=6)
        .map(|n| {
            let description = long_text(&n.to_string(), 300);
            let mut obs = common::observation(Classification::Positive, &description);
            obs.photos = vec![ImageAsset::new(common::jpeg(80, 60))];
            if n % 2 == 0 {
                obs.action = Some(format!("ACTION{n} a planifier avec le syndic"));
            }
            obs
        })
        .collect();

    let report = compose_report(&input, &ReportConfig::default()).unwrap();
    let pages = report.pages();
    assert!(report.page_count() > 6);
    let photos: usize = pages.iter().map(|p| images(p).len()).sum();
    assert_eq!(photos, 1 + 6 + 1);
    assert_within_bottom(pages, &PageGeometry::default());

    for n in 1..=6 {
        let label = page_of(pages, &format!("Observation {n} - ")).unwrap();
        assert_eq!(page_of(pages, &format!("DEBUT{n}")), Some(label), "observation {n}");
        assert_eq!(page_of(pages, &format!("FIN{n}")), Some(label), "observation {n}");
        if n % 2 == 0 {
            assert_eq!(page_of(pages, &format!("ACTION{n}")), Some(label));
        }
    }

    // input order is kept
    let order: Vec<usize> = (1..=6)
        .map(|n| page_of(pages, &format!("Observation {n} - ")).unwrap())
        .collect();
    assert!(order.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn body_text_stays_inside_content_area() {
    let mut input = common::sample_input();
    input.observations = (1..=5)
        .map(|n| {
            common::observation(
                Classification::NeedsImprovement,
                &long_text(&n.to_string(), 250),
            )
        })
        .collect();
    let report = compose_report(&input, &ReportConfig::default()).unwrap();
    let g = PageGeometry::default();

    for page in &report.pages()[1..report.page_count() - 1] {
        for op in page.ops() {
            if let DrawOp::Text { text, y, .. } = op {
                if text.starts_with("DEBUT") || text.starts_with("constat") {
                    assert!(*y > g.content_top && *y <= g.content_bottom(), "{text} at {y}");
                }
            }
        }
    }
}

#[test]
fn description_taller_than_a_page_flows_on() {
    let mut input = common::sample_input();
    input.observations = vec![common::observation(
        Classification::Positive,
        &long_text("X", 2000),
    )];
    let report = compose_report(&input, &ReportConfig::default()).unwrap();
    let pages = report.pages();

    let start = page_of(pages, "DEBUTX").unwrap();
    let end = page_of(pages, "FINX").unwrap();
    assert_eq!(start, page_of(pages, "Observation 1 - ").unwrap());
    assert!(end > start);
    assert!(pages.last().unwrap().contains_text("VALIDATION DU RAPPORT"));
}

#[test]
fn placed_images_keep_aspect_ratio_and_fit_the_page() {
    let mut input = common::sample_input();
    let mut with_photos = common::observation(Classification::Positive, "Toiture refaite");
    with_photos.photos = vec![
        ImageAsset::new(common::jpeg(80, 60)),
        // portrait without metadata: rotated upright to 80×60
        ImageAsset::new(common::png(60, 80)),
        ImageAsset::new(common::jpeg_with_orientation(80, 60, 1)),
    ];
    input.observations.push(with_photos.clone());
    input.observations.push(with_photos);

    let report = compose_report(&input, &ReportConfig::default()).unwrap();
    let pages = report.pages();
    let g = PageGeometry::default();

    let total: usize = pages.iter().map(|p| images(p).len()).sum();
    assert_eq!(total, 1 + 6 + 1);
    assert_eq!(count(report.bytes(), b"/DCTDecode"), 7);

    let last = pages.len() - 1;
    for (i, page) in pages.iter().enumerate() {
        for (x, y, w, h) in images(page) {
            let expected = if i == last { 80.0 / 200.0 } else { 60.0 / 80.0 };
            assert!((h / w - expected).abs() < 1e-3, "page {} ratio {}", i + 1, h / w);
            assert!(x >= g.margin_left - 0.01);
            assert!(x + w <= g.page_width - g.margin_right + 0.01);
            assert!(y >= g.content_top - 0.01);
            assert!(y + h <= g.content_bottom() + 0.01, "page {} image ends at {}", i + 1, y + h);
        }
    }

    let mut ids: Vec<usize> = pages
        .iter()
        .flat_map(|p| p.images())
        .filter_map(|op| match op {
            DrawOp::Image { id, .. } => Some(id.index()),
            _ => None,
        })
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..8).collect::<Vec<_>>());

    let photos_page = page_of(pages, "Photos :").unwrap();
    assert!(images(&pages[photos_page]).len() >= 1);
}

#[test]
fn concurrent_composition_matches_sequential() {
    let inputs: Vec<_> = (0..6)
        .map(|n| {
            let mut input = common::sample_input();
            input.visit.building_code = format!("B{n:04}");
            input
        })
        .collect();
    let config = ReportConfig::default();

    let sequential: Vec<Vec<u8>> = inputs
        .iter()
        .map(|i| compose_report(i, &config).unwrap().into_bytes())
        .collect();
    let parallel: Vec<Vec<u8>> = inputs
        .par_iter()
        .map(|i| compose_report(i, &config).unwrap().into_bytes())
        .collect();

    assert_eq!(sequential, parallel);
}

#[test]
fn email_draft_describes_the_report() {
    let input = common::sample_input();
    let report = compose_report(&input, &ReportConfig::default()).unwrap();
    let draft = EmailDraft::for_report(&input.visit, &report);

    assert_eq!(
        draft.subject,
        "Rapport de visite - 12 rue des Lilas, 69003 Lyon - 2024-03-14"
    );
    assert_eq!(draft.attachment_name, "rapport_visite_20240314.pdf");
    assert!(draft.body.contains("2024-03-14"));
    assert!(draft.body.contains("12 rue des Lilas"));
}

#[test]
fn custom_branding_is_printed() {
    let mut config = ReportConfig::default();
    config.branding.organization = "Syndic Dupont".into();
    config.branding.author_role = "Gestionnaire technique".into();
    let report = compose_report(&common::sample_input(), &config).unwrap();

    assert!(report.pages().iter().all(|p| p.contains_text("Syndic Dupont")));
    assert!(report.pages()[2].contains_text("Gestionnaire technique"));
}

#[test]
fn generate_report_writes_dated_file() {
    common::init_logging();
    let dir = common::output_dir("generate_report");
    let path = generate_report(&common::sample_input(), &ReportConfig::default(), &dir).unwrap();

    assert_eq!(path, dir.join("rapport_visite_20240314.pdf"));
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
}

#[test]
fn unset_optional_fields_leave_no_rows() {
    let full = compose_report(&common::sample_input(), &ReportConfig::default()).unwrap();

    let mut input = common::sample_input();
    input.visit.arrival_time = None;
    input.visit.departure_time = None;
    input.visit.persons_present = None;
    let sparse = compose_report(&input, &ReportConfig::default()).unwrap();

    let page = &sparse.pages()[0];
    assert!(page.contains_text("Adresse:"));
    assert!(page.contains_text("Code:"));
    assert!(!page.contains_text("Heure d'arrivee:"));
    assert!(!page.contains_text("Heure de depart:"));
    assert!(!page.contains_text("Personnes presentes:"));

    let sparse_h = info_frames(page);
    let full_h = info_frames(&full.pages()[0]);
    assert_eq!(sparse_h, vec![10.0 + 3.0 * 8.0]);
    assert_eq!(full_h, vec![10.0 + 6.0 * 8.0]);
    assert!(sparse_h[0] < full_h[0]);

    // blank persons text counts as unset
    input.visit.persons_present = Some("  \n ".into());
    let blank = compose_report(&input, &ReportConfig::default()).unwrap();
    assert_eq!(info_frames(&blank.pages()[0]), sparse_h);
}

#[test]
fn long_persons_list_flows_onto_next_page() {
    let mut input = common::sample_input();
    let persons = vec!["Monsieur Jean-Baptiste Dupont"; 120].join(" ");
    input.visit.persons_present = Some(format!("{persons} FINPERSONNES"));

    let report = compose_report(&input, &ReportConfig::default()).unwrap();
    let pages = report.pages();
    let g = PageGeometry::default();

    assert!(pages[0].contains_text("Adresse:"));
    assert!(pages[0].contains_text("Personnes presentes:"));
    assert!(pages[0].contains_text("Monsieur Jean-Baptiste Dupont"));
    assert!(page_of(pages, "FINPERSONNES").unwrap() > 0);
    assert_within_bottom(pages, &g);

    // the observations still start on a page of their own
    let banner = page_of(pages, "OBSERVATIONS").unwrap();
    assert!(banner > page_of(pages, "FINPERSONNES").unwrap());
    assert!(pages.last().unwrap().contains_text("VALIDATION DU RAPPORT"));
}

#[test]
fn directory_sink_records_deliveries() {
    let input = common::sample_input();
    let report = compose_report(&input, &ReportConfig::default()).unwrap();
    let draft = EmailDraft::for_report(&input.visit, &report);

    let dir = common::output_dir("directory_sink");
    let mut sink = DirectorySink::new(&dir);
    assert_eq!(sink.dir(), dir.as_path());
    assert!(sink.delivered().is_empty());

    sink.deliver(&report, &draft).unwrap();
    let expected = dir.join("rapport_visite_20240314.pdf");
    assert_eq!(sink.delivered(), [expected.clone()].as_slice());
    assert_eq!(std::fs::read(&expected).unwrap(), report.bytes());
}
