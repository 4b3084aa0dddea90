use anyhow::Result;
use std::io::Cursor;

use catalog_stats::app::LookupUseCase;
use catalog_stats::config::NormalizeConfig;
use catalog_stats::pipeline::{load, normalize};
use catalog_stats::presentation::Menu;

const CATALOG: &str = "\
show_id,type,title,director,cast,country,date_added,release_year,rating,duration,listed_in,description
s1,Movie,Sankofa,Haile Gerima,\"Kofi Ghanaba, Oyafunmike Ogunlano\",\"United States, Ghana\",\"September 24, 2021\",1993,TV-MA,125 min,\"Dramas, International Movies\",A
s2,Movie,The Great British Baking Show,Andy Devonshire,\"Mel Giedroyc, Sue Perkins\",United Kingdom,\"September 24, 2021\",2021,TV-14,1 Season,\"British TV Shows, Reality TV\",B
s3,Movie,Ashes,,Kofi Ghanaba,Ghana,\"May 1, 2020\",2019,TV-MA,88 min,Dramas,C
";

fn run_session(script: &str) -> Result<String> {
    let snapshot = normalize(&load(CATALOG.as_bytes())?, &NormalizeConfig::default())?;
    let lookup = LookupUseCase::new(&snapshot)?;
    let mut output = Vec::new();
    Menu::new(&lookup)
        .with_max_results(1)
        .run(Cursor::new(script), &mut output)?;
    Ok(String::from_utf8(output)?)
}

#[test]
fn test_actor_then_category_lookup() -> Result<()> {
    let out = run_session("2\nkofi ghanaba\ny\n4\nreality\nn\n")?;

    assert!(out.contains("2 titles matched actor \"kofi ghanaba\""));
    assert!(out.contains("Sankofa (1993)"));
    // capped at one result
    assert!(out.contains("... and 1 more"));
    assert!(out.contains("1 titles matched category \"reality\""));
    assert!(out.ends_with("Goodbye!\n"));
    Ok(())
}

#[test]
fn test_invalid_input_reprompts() -> Result<()> {
    let out = run_session("abc\n3\n\nno data\nmaybe\nn\n")?;

    assert!(out.contains("Invalid choice \"abc\", pick 1-5"));
    assert!(out.contains("Please enter a search term"));
    // the sentinel itself never matches
    assert!(out.contains("No titles found for director \"no data\""));
    assert!(out.contains("Please answer y or n"));
    Ok(())
}

#[test]
fn test_exit_from_main_menu() -> Result<()> {
    let out = run_session("5\n")?;
    assert_eq!(out.matches("Choose an option: ").count(), 1);
    assert!(out.ends_with("Goodbye!\n"));
    Ok(())
}
