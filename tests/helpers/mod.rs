//! Shared fixtures for integration tests.

use chrono::Utc;
use prospectus::extract::assembler::{ExtractionOutcome, extract_record};
use prospectus::extract::observer::NullObserver;
use prospectus::model::CaptureRecord;

pub fn make_capture(slug: &str, year: u16) -> CaptureRecord {
    CaptureRecord {
        slug: slug.to_string(),
        source_year: year,
        file: format!("{slug}-{year}.html").into(),
        captured_at: Utc::now(),
        byte_len: 0,
        content_hash: "deadbeef".to_string(),
    }
}

pub fn extract(html: &str, slug: &str, year: u16) -> ExtractionOutcome {
    extract_record(html.as_bytes(), &make_capture(slug, year), &NullObserver)
}

/// A school-profile page with the given ranking markup spliced into the
/// rank badge slot.
pub fn profile_page(rank_badge: &str) -> String {
    format!(
        r#"<html>
        <head>
        <script type="application/ld+json">
        {{
            "@type": "HighSchool",
            "name": "Abbeville High School",
            "telephone": "(864) 366-5076",
            "location": {{
                "address": {{
                    "streetAddress": "701 Washington St",
                    "addressLocality": "Abbeville",
                    "addressRegion": "SC",
                    "postalCode": "29620"
                }}
            }}
        }}
        </script>
        </head>
        <body>
            <h1 data-testid="school-name">Abbeville High School</h1>
            <span data-testid="rank-badge">{rank_badge}</span>
            <div data-testid="grades-range">9-12</div>
            <div data-testid="enrollment">812</div>
            <div data-testid="student-teacher-ratio">14:1</div>
            <div data-testid="graduation-rate">89%</div>
        </body>
        </html>"#
    )
}
