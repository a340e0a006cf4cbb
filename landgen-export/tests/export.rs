use landgen_core::{
    Branch, Client, Location, Page, PageContent, Service, StaffMember, Testimonial,
};
use landgen_export::{validate_file, ExportError, Exporter, PageRejection};
use landgen_shared::RecordId;
use landgen_store::app_config::ExportConfig;
use landgen_store::{Dataset, MemoryStore};
use std::sync::Arc;

fn id(s: &str) -> RecordId {
    RecordId::new(s)
}

fn page(key: &str, service: Option<&str>, location: Option<&str>, number: u64) -> Page {
    Page {
        id: id(key),
        client: Some(id("acme")),
        service: service.map(id),
        location: location.map(id),
        target_keyword: Some("bathroom remodel".to_string()),
        offer: None,
        matched_branch: Some(id("b-medina")),
        published: false,
        status: "Draft".to_string(),
        notes: None,
        content: PageContent {
            page_number: Some(number),
            faqs: Some("{ broken".to_string()),
            ..Default::default()
        },
    }
}

fn branch(key: &str, latitude: Option<f64>, longitude: Option<f64>) -> Branch {
    Branch {
        id: id(key),
        name: format!("{} branch", key),
        client: Some(id("acme")),
        active: true,
        phone: Some("(330) 555-0100".to_string()),
        email: None,
        address: None,
        timezone: None,
        hours: None,
        latitude,
        longitude,
    }
}

fn dataset(branches: Vec<Branch>) -> Dataset {
    Dataset {
        clients: vec![Client {
            id: id("acme"),
            name: "Acme Baths".to_string(),
            domain: None,
            active: true,
            logo_url: None,
            primary_color: Some("#111827".to_string()),
            secondary_color: None,
            google_fonts: None,
            gtm_container_id: Some("GTM-TEST".to_string()),
            ga_property_id: None,
        }],
        locations: vec![Location {
            id: id("strongsville"),
            city: "Strongsville".to_string(),
            state: "OH".to_string(),
            slug: "strongsville".to_string(),
            active: true,
            seo_keywords: Some("strongsville, bathroom remodel strongsville".to_string()),
        }],
        services: vec![Service {
            id: id("bath"),
            name: "Bathroom Remodeling".to_string(),
            slug: "bathroom-remodeling".to_string(),
            keywords: None,
            active: true,
            client: Some(id("acme")),
            description: Some("Full bathroom renovations".to_string()),
        }],
        branches,
        pages: vec![
            page("recGood", Some("bath"), Some("strongsville"), 1),
            page("recNoService", None, Some("strongsville"), 2),
            page("recNational", Some("bath"), None, 3),
        ],
        testimonials: vec![Testimonial {
            id: id("t1"),
            client: Some(id("acme")),
            service: None,
            branch: None,
            rating: Some(5),
            active: true,
            customer_name: Some("Pat".to_string()),
            customer_city: Some("Medina".to_string()),
            customer_state: Some("OH".to_string()),
            review_title: None,
            review_text: Some("Great work".to_string()),
            review_date: None,
            source: None,
        }],
        staff: vec![StaffMember {
            id: id("s1"),
            branch: Some(id("b-medina")),
            active: true,
            full_name: Some("Dana Reyes".to_string()),
            job_title: Some("Project Manager".to_string()),
            years_experience: Some(12),
            bio: None,
            photo_url: None,
            primary_contact: true,
        }],
        ..Default::default()
    }
}

fn output_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("landgen-{}-{}.json", name, std::process::id()))
}

#[tokio::test]
async fn test_bad_pages_are_skipped_not_fatal() {
    let store = Arc::new(MemoryStore::new(dataset(vec![branch(
        "b-medina",
        Some(41.14),
        Some(-81.86),
    )])));
    let exporter = Exporter::new(store, ExportConfig::default());

    let report = exporter.build().await.unwrap();

    assert_eq!(report.content.pages.len(), 1);
    assert_eq!(report.content.metadata.total_pages, report.content.pages.len());
    assert_eq!(report.rejected.len(), 2);
    assert!(report
        .rejected
        .contains(&PageRejection::MissingServiceSlug { page: id("recNoService") }));
    assert!(report
        .rejected
        .contains(&PageRejection::MissingLocationSlug { page: id("recNational") }));

    let exported = &report.content.pages[0];
    assert_eq!(exported.page_id, 1);
    assert_eq!(exported.service, "bathroom-remodeling");
    assert!(exported.content.faqs.is_empty());
    assert_eq!(exported.content.service_description, "Full bathroom renovations");
    assert_eq!(exported.branding.primary_color, "#111827");
    assert_eq!(exported.tracking.gtm_id, "GTM-TEST");
    assert_eq!(exported.branch.phone, "(330) 555-0100");
    assert_eq!(exported.branch.staff.len(), 1);
    assert_eq!(exported.social_proof.total_reviews, 1);
}

#[tokio::test]
async fn test_zero_valid_pages_fails_export() {
    let mut data = dataset(vec![branch("b-medina", Some(41.14), Some(-81.86))]);
    data.pages.retain(|p| p.id != id("recGood"));
    let exporter = Exporter::new(Arc::new(MemoryStore::new(data)), ExportConfig::default());

    let result = exporter.build().await;
    assert!(matches!(result, Err(ExportError::NoValidPages { rejected: 2 })));
}

#[tokio::test]
async fn test_written_artifact_passes_coordinate_gate() {
    let path = output_path("gate-ok");
    let config = ExportConfig {
        output_path: path.to_string_lossy().into_owned(),
        ..Default::default()
    };
    let store = Arc::new(MemoryStore::new(dataset(vec![branch(
        "b-medina",
        Some(41.49),
        Some(-81.69),
    )])));

    let report = Exporter::new(store, config).run().await.unwrap();
    assert_eq!(report.content.branches.len(), 1);

    let gate = validate_file(&path).await.unwrap();
    assert!(gate.passed());
    assert!(gate.warnings.is_empty());

    let written: serde_json::Value =
        serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
    assert_eq!(written["metadata"]["totalPages"], 1);
    assert_eq!(written["pages"][0]["hero"]["primaryCta"]["actionValue"], "#contact-form");
    assert!(written["pages"][0].get("offer").is_none());

    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn test_bad_coordinates_fail_gate() {
    let path = output_path("gate-bad");
    let config = ExportConfig {
        output_path: path.to_string_lossy().into_owned(),
        ..Default::default()
    };
    let store = Arc::new(MemoryStore::new(dataset(vec![
        branch("b-medina", Some(95.0), Some(-81.69)),
        branch("b-akron", None, Some(-81.52)),
        branch("b-placeholder", Some(0.0), Some(0.0)),
    ])));

    Exporter::new(store, config).run().await.unwrap();
    let gate = validate_file(&path).await.unwrap();

    assert!(!gate.passed());
    assert_eq!(gate.branches_checked, 3);
    assert_eq!(gate.errors.len(), 2);
    assert_eq!(gate.errors[0].branch_id, "b-medina");
    assert_eq!(gate.errors[1].branch_id, "b-akron");
    assert!(gate.warnings.iter().all(|w| w.branch_id == "b-placeholder"));

    let _ = tokio::fs::remove_file(&path).await;
}
