use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use tft_melt::melt::{build, project, Selection};
use tft_melt::{melt_directory, Externals, RuleSet, SourceDocument};

fn sample_match(match_id: &str) -> Value {
    json!({
        "metadata": {"match_id": match_id, "participants": ["p1"]},
        "info": {
            "game_datetime": 1718000000000_u64,
            "game_length": 2011.5,
            "queue_id": 1100,
            "tft_set_number": 14,
            "tft_set_core_name": "TFTSet14",
            "game_version": "Version 14.12",
            "participants": [{
                "puuid": "p1",
                "placement": 3,
                "level": 8,
                "last_round": 32,
                "riotIdGameName": "Ahri Main",
                "riotIdTagline": "NA1",
                "companion": {"species": "PetTFTAvatar", "skin_ID": 12, "item_ID": 4001},
                "augments": ["TFT9_Augment_Cluttered"],
                "units": [
                    {"character_id": "TFT14_Ahri", "tier": 2, "rarity": 4, "itemNames": ["TFT_Item_GuinsoosRageblade"]},
                    {"character_id": "TFT14_Jinx", "tier": 1, "rarity": 1, "itemNames": []}
                ],
                "traits": [
                    {"name": "TFT14_Trait_Sorcerer", "num_units": 2, "style": 1, "tier_current": 1, "tier_total": 3}
                ]
            }]
        }
    })
}

fn two_player_match() -> Value {
    json!({
        "metadata": {"match_id": "NA1_77"},
        "info": {"participants": [
            {"puuid": "p1", "units": [{"character_id": "TFT14_A"}, {"character_id": "TFT14_B"}], "traits": []},
            {"puuid": "p2", "units": [{"character_id": "TFT14_C"}], "traits": [{"name": "TFT14_Trait_X"}]}
        ]}
    })
}

#[test]
fn single_match_produces_linked_tables() {
    let rules = RuleSet::builtin().unwrap();
    let batch = build(
        vec![Ok(SourceDocument::new("m1", sample_match("NA1_5012")))],
        &rules,
        Externals::new(),
    );

    assert_eq!(batch.table("participant").unwrap().len(), 1);
    assert_eq!(batch.table("trait").unwrap().len(), 1);

    let units = batch.table("unit").unwrap();
    assert_eq!(units.len(), 2);
    assert_eq!(units.column_values("items"), vec![&json!("GuinsoosRageblade"), &json!("")]);
    assert_eq!(units.column_values("unit_id"), vec![&json!("Ahri"), &json!("Jinx")]);
    assert_eq!(units.column_values("puuid"), vec![&json!("p1"), &json!("p1")]);

    let traits = batch.table("trait").unwrap();
    assert_eq!(traits.rows[0]["trait_id"], "Sorcerer");
    assert_eq!(traits.rows[0]["puuid"], "p1");

    let augments = batch.table("augment").unwrap();
    assert_eq!(augments.rows[0]["augment_slot"], 0);
    assert_eq!(augments.rows[0]["augment_name"], "Cluttered");

    let profile = batch.table("participant_profile").unwrap();
    assert_eq!(profile.rows[0]["companion_skin_id"], 12);
    assert_eq!(profile.rows[0]["region"], "NA1");
}

#[test]
fn parent_key_follows_enclosing_participant() {
    let rules = RuleSet::builtin().unwrap();
    let batch = build(
        vec![Ok(SourceDocument::new("m", two_player_match()))],
        &rules,
        Externals::new(),
    );

    let units = batch.table("unit").unwrap();
    assert_eq!(
        units.column_values("puuid"),
        vec![&json!("p1"), &json!("p1"), &json!("p2")]
    );
    assert_eq!(batch.table("trait").unwrap().rows[0]["puuid"], "p2");
}

#[test]
fn projection_all_and_allowlist() {
    let rules = RuleSet::builtin().unwrap();
    let batch = build(
        vec![Ok(SourceDocument::new("m1", sample_match("NA1_5012")))],
        &rules,
        Externals::new(),
    );
    let participants = batch.table("participant").unwrap().clone();

    let all = project(participants.clone(), &Selection::All);
    assert_eq!(all, participants);

    let picked = project(
        participants,
        &Selection::Columns(vec!["puuid".into(), "augment_count".into()]),
    );
    assert_eq!(picked.columns, vec!["puuid", "augment_count"]);
    assert_eq!(picked.rows[0]["augment_count"], Value::Null);
}

#[test]
fn directory_batch_skips_bad_documents_and_writes_csv() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    fs::write(input.path().join("1.json"), sample_match("EUW1_1").to_string()).unwrap();
    fs::write(input.path().join("2.json"), "{\"metadata\": ").unwrap();
    fs::write(input.path().join("3.json"), sample_match("EUW1_3").to_string()).unwrap();

    let rules = RuleSet::builtin().unwrap();
    let summary = melt_directory(input.path(), &rules, "default", Externals::new(), output.path()).unwrap();

    assert_eq!(summary.partition, "EUW1");
    assert_eq!(summary.documents_accepted, 2);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].label, "2.json");

    let dir = output.path().join("matches_EUW1");
    let mut files: Vec<_> = fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(files, vec!["match.csv", "participant.csv", "trait.csv", "unit.csv"]);

    let units = fs::read_to_string(dir.join("unit.csv")).unwrap();
    assert_eq!(
        units,
        "match_id,puuid,unit_id,star_level,rarity,items\n\
         EUW1_1,p1,Ahri,2,4,GuinsoosRageblade\n\
         EUW1_1,p1,Jinx,1,1,\n\
         EUW1_3,p1,Ahri,2,4,GuinsoosRageblade\n\
         EUW1_3,p1,Jinx,1,1,\n"
    );

    let matches = fs::read_to_string(dir.join("match.csv")).unwrap();
    assert_eq!(
        matches.lines().next().unwrap(),
        "match_id,game_datetime,game_length,queue_id,set_number"
    );
}

#[test]
fn empty_table_writes_no_file() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    let bare = json!({"metadata": {"match_id": "KR_9"}, "info": {"participants": [{"puuid": "p1"}]}});
    fs::write(input.path().join("m.json"), bare.to_string()).unwrap();

    let rules = RuleSet::builtin().unwrap();
    let summary = melt_directory(input.path(), &rules, "full", Externals::new(), output.path()).unwrap();

    let dir = output.path().join("matches_KR");
    assert_eq!(summary.written.len(), 3);
    assert!(dir.join("participant.csv").exists());
    assert!(dir.join("participant_profile.csv").exists());
    assert!(!dir.join("unit.csv").exists());
    assert!(!dir.join("trait.csv").exists());
    assert!(!dir.join("augment.csv").exists());
}
