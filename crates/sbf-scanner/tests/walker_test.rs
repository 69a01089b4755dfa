mod common;

use common::{test_config, FakeBlock, FakeFlatType, FakeSite, FakeTown};
use sbf_browser::BrowserActions;
use sbf_core::{keys, CellValue, TownLink};
use sbf_scanner::{parser, HierarchyWalker};

fn two_type_town() -> FakeTown {
    FakeTown::new(
        "tengah",
        "Tengah",
        5,
        vec![
            FakeFlatType {
                label: "3-Room".to_string(),
                blocks: vec![
                    FakeBlock::with_units("101A", 5, 2),
                    FakeBlock::with_units("101B", 7, 1),
                ],
            },
            FakeFlatType {
                label: "4-Room".to_string(),
                blocks: vec![FakeBlock::with_units("205", 12, 2)],
            },
        ],
    )
}

#[tokio::test]
async fn test_walk_visits_every_flat_type_and_block() {
    let config = test_config();
    let site = FakeSite::new(&[], Vec::new(), vec![two_type_town()]);
    let link = TownLink::parse(&common::town_link("tengah")).unwrap();

    site.navigate(link.as_str()).await.unwrap();
    let details = site.extract_text(&config.selectors.town_details).await.unwrap();
    let town = parser::parse_town(&details, &link).unwrap();

    let records = HierarchyWalker::new(&site, &config)
        .walk(&town)
        .await
        .expect("walk");

    assert_eq!(records.len(), 5);

    let visited: Vec<(String, String)> = records
        .iter()
        .map(|r| {
            (
                r.get(keys::FLAT_TYPE).unwrap().to_string(),
                r.get(keys::BLOCK).unwrap().to_string(),
            )
        })
        .collect();
    let expected: Vec<(String, String)> = [
        ("3-Room", "101A"),
        ("3-Room", "101A"),
        ("3-Room", "101B"),
        ("4-Room", "205"),
        ("4-Room", "205"),
    ]
    .iter()
    .map(|(f, b)| ((*f).to_string(), (*b).to_string()))
    .collect();
    assert_eq!(visited, expected);
}

#[tokio::test]
async fn test_walk_merges_town_block_and_unit_fields() {
    let config = test_config();
    let site = FakeSite::new(&[], Vec::new(), vec![two_type_town()]);
    let link = TownLink::parse(&common::town_link("tengah")).unwrap();

    site.navigate(link.as_str()).await.unwrap();
    let details = site.extract_text(&config.selectors.town_details).await.unwrap();
    let town = parser::parse_town(&details, &link).unwrap();

    let records = HierarchyWalker::new(&site, &config).walk(&town).await.unwrap();
    let last = records.last().unwrap();

    assert_eq!(last.get(keys::TOWN), Some(&CellValue::from("Tengah")));
    assert_eq!(last.get(keys::REMAINING_LEASE), Some(&CellValue::Integer(99)));
    assert_eq!(last.get("Malay"), Some(&CellValue::from("Available")));
    assert_eq!(last.get(keys::LEVEL), Some(&CellValue::Integer(12)));
    assert_eq!(last.get(keys::UNIT), Some(&CellValue::from("A1")));
    assert_eq!(last.get(keys::SQM), Some(&CellValue::Integer(65)));
    assert_eq!(last.get(keys::PRICE), Some(&CellValue::Integer(350_000)));
    // The link is only added once the town reconciles
    assert!(!last.contains_key(keys::LINK));
}

#[tokio::test]
async fn test_walk_town_without_flat_types() {
    let config = test_config();
    let site = FakeSite::new(&[], Vec::new(), vec![FakeTown::new("empty", "Empty", 0, Vec::new())]);
    let link = TownLink::parse(&common::town_link("empty")).unwrap();

    site.navigate(link.as_str()).await.unwrap();
    let details = site.extract_text(&config.selectors.town_details).await.unwrap();
    let town = parser::parse_town(&details, &link).unwrap();

    let records = HierarchyWalker::new(&site, &config).walk(&town).await.unwrap();
    assert!(records.is_empty());
}
