// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use wxcrawl::domain::services::extraction_service::{
    get_air_quality, safely_get_text, AbsentReason, Extraction,
};
use wxcrawl::engines::memory_engine::MemoryEngine;
use wxcrawl::engines::session::{BrowserSession, Locator, Scope};
use wxcrawl::utils::retry_policy::RetryPolicy;

const DETAIL: &str = r#"
<html><body>
  <div class="air-rules">
    <span class="air-active">Tốt</span>
    <span class="air-active">Kém</span>
  </div>
  <p class="blank">   </p>
</body></html>
"#;

fn session(engine: MemoryEngine) -> BrowserSession {
    BrowserSession::new(Arc::new(engine), Duration::from_secs(1))
}

#[tokio::test]
async fn test_safely_get_text_returns_caller_default() {
    let url = "https://thoitiet.test/ha-noi/ba-dinh";
    let mut session = session(MemoryEngine::new().with_page(url, DETAIL));

    // before any page is loaded
    assert_eq!(
        safely_get_text(&session, Scope::Page, &Locator::css("p"), "none"),
        "none"
    );

    session.navigate(url).await.unwrap();
    assert_eq!(
        safely_get_text(&session, Scope::Page, &Locator::css(".air-active"), ""),
        "Tốt"
    );
    assert_eq!(
        safely_get_text(&session, Scope::Page, &Locator::css(".missing"), ""),
        ""
    );
    assert_eq!(
        safely_get_text(&session, Scope::Page, &Locator::css("p.blank"), " N/A "),
        " N/A "
    );
}

#[test]
fn test_extraction_default_is_used_verbatim() {
    assert_eq!(Extraction::Found("Tốt".to_string()).or_default_text("x"), "Tốt");
    assert_eq!(Extraction::Absent(AbsentReason::Empty).or_default_text(""), "");
    assert!(!Extraction::Absent(AbsentReason::NotFound).is_found());
}

#[tokio::test]
async fn test_air_quality_index_and_fallback() {
    let url = "https://thoitiet.test/ha-noi/ba-dinh";
    let engine = MemoryEngine::new().with_page(url, DETAIL);
    let mut session = session(engine);
    let policy = RetryPolicy::immediate(2);

    assert_eq!(get_air_quality(&mut session, url, 0, &policy).await, "Tốt");
    assert_eq!(get_air_quality(&mut session, url, 1, &policy).await, "Kém");
    assert_eq!(get_air_quality(&mut session, url, 5, &policy).await, "N/A");
    assert_eq!(
        get_air_quality(&mut session, "https://thoitiet.test/none", 0, &policy).await,
        "N/A"
    );
    assert_eq!(session.pages_visited(), 3);
}
