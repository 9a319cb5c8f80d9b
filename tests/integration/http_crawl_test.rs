// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    base_date, detail_page, home_page, hourly_page, province_page, test_settings, ProvinceFixture,
};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wxcrawl::engines::reqwest_engine::ReqwestEngine;
use wxcrawl::infrastructure::storage::read_records;
use wxcrawl::workers::CrawlWorker;

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_crawl_over_http_with_failing_district() {
    let server = MockServer::start().await;
    let province = ProvinceFixture::new(
        "Hà Nội",
        "ha-noi",
        &[("Ba Đình", "ba-dinh"), ("Hoàn Kiếm", "hoan-kiem")],
    );

    mount_page(&server, "/", home_page(std::slice::from_ref(&province))).await;
    mount_page(&server, "/ha-noi", province_page(&province)).await;
    mount_page(&server, "/ha-noi/ba-dinh", detail_page("Trung bình")).await;
    mount_page(&server, "/ha-noi/ba-dinh/theo-gio", hourly_page(base_date(), 3, 2)).await;
    mount_page(&server, "/ha-noi/hoan-kiem", detail_page("Tốt")).await;
    Mock::given(method("GET"))
        .and(path("/ha-noi/hoan-kiem/theo-gio"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ip"))
        .respond_with(ResponseTemplate::new(200).set_body_string("203.0.113.7\n"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut settings = test_settings(&server.uri(), dir.path());
    settings.identity.enabled = true;
    settings.identity.lookup_url = format!("{}/ip", server.uri());

    let report = CrawlWorker::new(Arc::new(ReqwestEngine::new()), settings)
        .with_base_date(base_date())
        .run()
        .await
        .unwrap();

    assert_eq!(report.public_ip.as_deref(), Some("203.0.113.7"));
    assert_eq!(report.provinces, 1);
    assert_eq!(report.districts, 2);
    assert_eq!(report.records, 3 * 2 + 1);
    assert_eq!(report.sentinels, 1);

    let records = read_records(&report.output.unwrap()).await.unwrap();
    assert_eq!(records[0].district, "Ba Đình");
    assert_eq!(records[0].air_quality, "Trung bình");
    assert_eq!(records[0].temperature_max, "28");
    assert_eq!(records[0].humidity, "80");
    assert_eq!(records[0].pressure, "1010");
    assert_eq!(records[0].visibility, "10");
    assert_eq!(records[0].uv_index, "4");
    assert_eq!(records[0].description, "Trời nhiều mây");
    assert_eq!(records[5].date, "2025-10-21");

    let sentinel = &records[6];
    assert_eq!(sentinel.district, "Hoàn Kiếm");
    assert!(sentinel.is_sentinel());
    assert_eq!(
        sentinel.url,
        format!("{}/ha-noi/hoan-kiem/theo-gio", server.uri())
    );
}
