// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{base_date, register_site, test_settings, ProvinceFixture, BASE_URL};
use regex::Regex;
use std::sync::Arc;
use tempfile::TempDir;
use wxcrawl::domain::models::weather::{StopPoint, CSV_HEADER, NOT_AVAILABLE};
use wxcrawl::engines::memory_engine::MemoryEngine;
use wxcrawl::infrastructure::storage::{parse_rows, read_records};
use wxcrawl::workers::CrawlWorker;

const PER_DAY: usize = 4;

fn two_by_two() -> Vec<ProvinceFixture> {
    vec![
        ProvinceFixture::new(
            "Hà Nội",
            "ha-noi",
            &[("Ba Đình", "ba-dinh"), ("Hoàn Kiếm", "hoan-kiem")],
        ),
        ProvinceFixture::new(
            "Hải Phòng",
            "hai-phong",
            &[("Lê Chân", "le-chan"), ("Ngô Quyền", "ngo-quyen")],
        ),
    ]
}

#[tokio::test]
async fn test_full_crawl_two_provinces_two_districts() {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(MemoryEngine::new());
    register_site(&engine, BASE_URL, &two_by_two(), PER_DAY);

    let worker = CrawlWorker::new(engine.clone(), test_settings(BASE_URL, dir.path()))
        .with_base_date(base_date());
    let report = worker.run().await.unwrap();

    assert_eq!(report.provinces, 2);
    assert_eq!(report.districts, 4);
    assert_eq!(report.records, 2 * 2 * 3 * PER_DAY);
    assert_eq!(report.sentinels, 0);
    // home + 2 province pages + 4 × (detail + hourly)
    assert_eq!(report.pages_visited, 11);

    let path = report.output.unwrap();
    let records = read_records(&path).await.unwrap();
    assert_eq!(records.len(), 48);
    assert!(records.iter().all(|r| r.stop_point == StopPoint::Ok));
    assert!(records.iter().all(|r| r.air_quality == "Tốt"));

    // grouped in traversal order
    assert_eq!(records[0].province, "Hà Nội");
    assert_eq!(records[0].district, "Ba Đình");
    assert_eq!(records[0].date, "2025-10-19");
    assert_eq!(records[0].time, "00:00");
    assert_eq!(records[12].district, "Hoàn Kiếm");
    assert_eq!(records[47].province, "Hải Phòng");
    assert_eq!(records[47].district, "Ngô Quyền");
    assert_eq!(records[47].date, "2025-10-21");
    assert_eq!(records[47].time, "03:00");
    assert_eq!(records[47].url, "https://thoitiet.test/hai-phong/ngo-quyen/theo-gio");
}

#[tokio::test]
async fn test_unreachable_district_yields_single_sentinel() {
    let dir = TempDir::new().unwrap();
    let provinces = vec![ProvinceFixture::new(
        "Đà Nẵng",
        "da-nang",
        &[("Hải Châu", "hai-chau")],
    )];
    let engine = Arc::new(MemoryEngine::new());
    register_site(&engine, BASE_URL, &provinces, PER_DAY);
    let hourly = "https://thoitiet.test/da-nang/hai-chau/theo-gio";
    engine.fail_url(hourly);

    let mut settings = test_settings(BASE_URL, dir.path());
    settings.crawl.max_attempts = 3;
    let report = CrawlWorker::new(engine.clone(), settings)
        .with_base_date(base_date())
        .run()
        .await
        .unwrap();

    assert_eq!(engine.calls(hourly), 3);
    assert_eq!(report.records, 1);
    assert_eq!(report.sentinels, 1);

    let records = read_records(&report.output.unwrap()).await.unwrap();
    assert_eq!(records.len(), 1);
    let sentinel = &records[0];
    assert!(sentinel.stop_point.to_string().starts_with("FAILED:"));
    assert_eq!(sentinel.province, "Đà Nẵng");
    assert_eq!(sentinel.district, "Hải Châu");
    assert_eq!(sentinel.temperature_max, NOT_AVAILABLE);
    assert_eq!(sentinel.humidity, NOT_AVAILABLE);
    assert_eq!(sentinel.description, NOT_AVAILABLE);
}

#[tokio::test]
async fn test_failed_district_does_not_stop_the_crawl() {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(MemoryEngine::new());
    register_site(&engine, BASE_URL, &two_by_two(), PER_DAY);
    engine.fail_url("https://thoitiet.test/ha-noi/hoan-kiem/theo-gio");

    let report = CrawlWorker::new(engine.clone(), test_settings(BASE_URL, dir.path()))
        .with_base_date(base_date())
        .run()
        .await
        .unwrap();

    assert_eq!(report.records, 3 * 12 + 1);
    assert_eq!(report.sentinels, 1);
    let records = read_records(&report.output.unwrap()).await.unwrap();
    assert_eq!(records[12].district, "Hoàn Kiếm");
    assert!(records[12].is_sentinel());
    assert_eq!(records[13].district, "Lê Chân");
}

#[tokio::test]
async fn test_empty_province_listing_writes_header_only() {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(
        MemoryEngine::new().with_page(BASE_URL, "<html><body><nav></nav></body></html>"),
    );

    let report = CrawlWorker::new(engine, test_settings(BASE_URL, dir.path()))
        .with_base_date(base_date())
        .run()
        .await
        .unwrap();

    assert_eq!(report.provinces, 0);
    assert_eq!(report.records, 0);
    let text = std::fs::read_to_string(report.output.unwrap()).unwrap();
    let rows = parse_rows(&text);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], CSV_HEADER);
}

#[tokio::test]
async fn test_unreachable_home_writes_header_only() {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(MemoryEngine::new());
    engine.fail_url(BASE_URL);

    let report = CrawlWorker::new(engine.clone(), test_settings(BASE_URL, dir.path()))
        .run()
        .await
        .unwrap();

    assert_eq!(engine.calls(BASE_URL), 3);
    assert_eq!(report.records, 0);
    assert!(report.output.unwrap().exists());
}

#[tokio::test]
async fn test_region_filter() {
    let dir = TempDir::new().unwrap();
    let mut provinces = two_by_two();
    provinces.push(
        ProvinceFixture::new("Bình Dương", "binh-duong", &[("Thủ Dầu Một", "thu-dau-mot")])
            .in_region("Đông Nam Bộ"),
    );
    let engine = Arc::new(MemoryEngine::new());
    register_site(&engine, BASE_URL, &provinces, PER_DAY);

    let mut settings = test_settings(BASE_URL, dir.path());
    settings.source.region = Some("Đông Nam Bộ".to_string());
    let report = CrawlWorker::new(engine.clone(), settings)
        .with_base_date(base_date())
        .run()
        .await
        .unwrap();

    assert_eq!(report.provinces, 1);
    assert_eq!(report.records, 12);
    assert_eq!(engine.calls("https://thoitiet.test/ha-noi"), 0);
}

#[tokio::test]
async fn test_concurrent_provinces_keep_order() {
    let dir = TempDir::new().unwrap();
    let mut provinces = two_by_two();
    provinces.push(ProvinceFixture::new("Huế", "hue", &[("Phú Xuân", "phu-xuan")]));
    let engine = Arc::new(MemoryEngine::new());
    register_site(&engine, BASE_URL, &provinces, PER_DAY);

    let mut settings = test_settings(BASE_URL, dir.path());
    settings.crawl.concurrency = 3;
    let report = CrawlWorker::new(engine.clone(), settings)
        .with_base_date(base_date())
        .run()
        .await
        .unwrap();

    assert_eq!(report.records, 5 * 12);
    assert_eq!(report.pages_visited, 1 + 3 + 5 * 2);

    let records = read_records(&report.output.unwrap()).await.unwrap();
    let order: Vec<&str> = records
        .iter()
        .map(|r| r.district.as_str())
        .collect::<Vec<_>>()
        .chunks(12)
        .map(|chunk| chunk[0])
        .collect();
    assert_eq!(order, vec!["Ba Đình", "Hoàn Kiếm", "Lê Chân", "Ngô Quyền", "Phú Xuân"]);
}

#[tokio::test]
async fn test_count_only_reports_census() {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(MemoryEngine::new());
    register_site(&engine, BASE_URL, &two_by_two(), PER_DAY);

    let mut settings = test_settings(BASE_URL, dir.path());
    settings.crawl.count_only = true;
    let report = CrawlWorker::new(engine.clone(), settings)
        .run()
        .await
        .unwrap();

    let census = report.census.unwrap();
    assert_eq!(census.provinces, 2);
    assert_eq!(census.districts, 4);
    assert_eq!(census.air_quality_urls, 6);
    assert_eq!(census.unique_urls, 6);
    assert_eq!(census.total_urls, 12);
    assert!(report.output.is_none());
    assert_eq!(engine.calls("https://thoitiet.test/ha-noi/ba-dinh/theo-gio"), 0);
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_generated_file_name_and_bom() {
    let dir = TempDir::new().unwrap();
    let provinces = vec![ProvinceFixture::new("Huế", "hue", &[("Phú Xuân", "phu-xuan")])];
    let engine = Arc::new(MemoryEngine::new());
    register_site(&engine, BASE_URL, &provinces, PER_DAY);

    let mut settings = test_settings(BASE_URL, &dir.path().join("out"));
    settings.output.file_name = None;
    settings.output.write_bom = true;
    let report = CrawlWorker::new(engine, settings)
        .with_base_date(base_date())
        .run()
        .await
        .unwrap();

    let path = report.output.unwrap();
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(
        Regex::new(r"^\d{4}-\d{2}-\d{2}_\d{2}-\d{2}_12\.csv$").unwrap().is_match(&name),
        "unexpected file name {}",
        name
    );
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
}
