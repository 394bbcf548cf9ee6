use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::Result;
use pretty_assertions::assert_eq;
use rayon::prelude::*;
use tempfile::{tempdir, TempDir};

use crate::overrides::{ModHandle, ModOverride, OverrideKind, OverrideSet, ScanOptions};

const ENGINE_INI: &str = r#"[XComGame.XComEngine]
+ModClassOverrides=(BaseGameClass="UIArmory_MainMenu", ModClass="UIArmory_MainMenu_LW")
; +ModClassOverrides=(BaseGameClass="Ignored", ModClass="Ignored_LW")
+ModClassOverrides=(BaseGameClass="XGAIPlayer",ModClass="XGAIPlayer_LW")

[Engine.ScriptPackages]
+NonNativePackages=LW_Overhaul
"#;

// Helper function to create a mod directory inside a temporary directory
fn create_test_mod() -> Result<(TempDir, Arc<ModHandle>)> {
    let temp_dir = tempdir()?;
    let root = temp_dir.path().join("LW_Overhaul");
    fs::create_dir_all(&root)?;
    let handle = Arc::new(ModHandle::new("LW_Overhaul", &root));
    Ok((temp_dir, handle))
}

// Helper function to write a file under the mod root, creating parent directories
fn write_mod_file(root: &Path, relative: &str, content: &str) -> Result<PathBuf> {
    let path = relative.split('/').fold(root.to_path_buf(), |path, part| path.join(part));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, content)?;
    Ok(path)
}

fn listener_source(screens: &[&str]) -> String {
    let mut content = String::from("class Listener extends UIScreenListener;\n\ndefaultproperties\n{\n");
    for screen in screens {
        content.push_str(&format!("\tScreenClass = {}\n", screen));
    }
    content.push_str("}\n");
    content
}

fn sorted_pairs(overrides: &[ModOverride]) -> Vec<(OverrideKind, String, String)> {
    let mut pairs: Vec<_> = overrides.iter()
        .map(|o| (o.kind, o.base_class.clone(), o.new_class.clone()))
        .collect();
    pairs.sort();
    pairs
}

#[test]
fn test_combines_config_and_source_overrides() -> Result<()> {
    let (_temp_dir, handle) = create_test_mod()?;
    write_mod_file(&handle.path, "Config/XComEngine.ini", ENGINE_INI)?;
    write_mod_file(&handle.path, "Src/LW_Overhaul/Classes/UISL_Shell.uc", &listener_source(&["UIShell", "none"]))?;
    write_mod_file(&handle.path, "Src/LW_Overhaul/Classes/UIArmory_MainMenu_LW.uc", &listener_source(&["UIArmory_MainMenu"]))?;

    let set = OverrideSet::with_defaults(Arc::clone(&handle));
    let overrides = set.get(false)?;

    assert_eq!(
        sorted_pairs(&overrides),
        vec![
            (OverrideKind::ClassOverride, "UIArmory_MainMenu".to_string(), "UIArmory_MainMenu_LW".to_string()),
            (OverrideKind::ClassOverride, "XGAIPlayer".to_string(), "XGAIPlayer_LW".to_string()),
            (OverrideKind::UIScreenListener, "UIArmory_MainMenu".to_string(), "UIArmory_MainMenu_LW".to_string()),
            (OverrideKind::UIScreenListener, "UIShell".to_string(), "UISL_Shell".to_string()),
        ]
    );
    assert!(overrides.iter().all(|o| Arc::ptr_eq(&o.owning_mod, &handle)));

    let stats = set.last_stats();
    assert_eq!(stats.class_overrides, 2);
    assert_eq!(stats.listener_overrides, 2);
    assert_eq!(stats.files_with_overrides, 2);
    assert!(set.scanned_at().is_some());

    Ok(())
}

#[test]
fn test_config_overrides_come_first() -> Result<()> {
    let (_temp_dir, handle) = create_test_mod()?;
    write_mod_file(&handle.path, "Config/XComEngine.ini", ENGINE_INI)?;
    write_mod_file(&handle.path, "Src/LW_Overhaul/Classes/UISL_Shell.uc", &listener_source(&["UIShell"]))?;

    let overrides = OverrideSet::with_defaults(handle).get(false)?;

    let kinds: Vec<OverrideKind> = overrides.iter().map(|o| o.kind).collect();
    assert_eq!(
        kinds,
        vec![OverrideKind::ClassOverride, OverrideKind::ClassOverride, OverrideKind::UIScreenListener]
    );
    Ok(())
}

#[test]
fn test_empty_mod_has_no_overrides() -> Result<()> {
    let (_temp_dir, handle) = create_test_mod()?;

    let set = OverrideSet::with_defaults(handle);
    assert!(!set.is_populated());

    let overrides = set.get(false)?;
    assert!(overrides.is_empty());
    assert!(set.is_populated());
    Ok(())
}

#[test]
fn test_missing_root_is_an_error() -> Result<()> {
    let temp_dir = tempdir()?;
    let handle = Arc::new(ModHandle::new("Gone", temp_dir.path().join("Gone")));

    let set = OverrideSet::with_defaults(handle);
    assert!(set.get(false).is_err());
    assert!(!set.is_populated());
    Ok(())
}

#[test]
fn test_root_that_is_a_file_is_an_error() -> Result<()> {
    let temp_dir = tempdir()?;
    let file = temp_dir.path().join("NotAMod.XComMod");
    fs::write(&file, "")?;

    let set = OverrideSet::with_defaults(Arc::new(ModHandle::new("NotAMod", &file)));
    assert!(set.get(false).is_err());
    Ok(())
}

#[test]
fn test_cached_snapshot_until_forced_refresh() -> Result<()> {
    let (_temp_dir, handle) = create_test_mod()?;
    write_mod_file(&handle.path, "Src/MyMod/Classes/First.uc", &listener_source(&["UIShell"]))?;

    let set = OverrideSet::with_defaults(Arc::clone(&handle));
    let first = set.get(false)?;
    let second = set.get(false)?;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.len(), 1);

    write_mod_file(&handle.path, "Src/MyMod/Classes/Second.uc", &listener_source(&["UIAvengerHUD", "UIStrategyMap"]))?;

    // no automatic invalidation
    assert_eq!(set.get(false)?.len(), 1);

    let refreshed = set.get(true)?;
    assert_eq!(refreshed.len(), 3);
    // earlier snapshots are unaffected
    assert_eq!(first.len(), 1);
    Ok(())
}

#[test]
fn test_failed_refresh_keeps_previous_snapshot() -> Result<()> {
    let (temp_dir, handle) = create_test_mod()?;
    write_mod_file(&handle.path, "Src/MyMod/Classes/First.uc", &listener_source(&["UIShell"]))?;

    let set = OverrideSet::with_defaults(Arc::clone(&handle));
    assert_eq!(set.get(false)?.len(), 1);

    fs::remove_dir_all(&handle.path)?;
    assert!(set.get(true).is_err());
    assert_eq!(set.get(false)?.len(), 1);

    drop(temp_dir);
    Ok(())
}

#[test]
fn test_reserved_subtree_contributes_nothing() -> Result<()> {
    let (_temp_dir, handle) = create_test_mod()?;
    write_mod_file(&handle.path, "Src/XComGame/Classes/UIScreenListener_Shell.uc", &listener_source(&["UIShell"]))?;
    write_mod_file(&handle.path, "Src/xcomgame/Classes/UIArmory.uc", &listener_source(&["UIArmory"]))?;
    write_mod_file(&handle.path, "Src/MyMod/Classes/Mine.uc", &listener_source(&["UIShell"]))?;

    let set = OverrideSet::with_defaults(handle);
    let overrides = set.get(false)?;

    assert_eq!(overrides.len(), 1);
    assert_eq!(overrides[0].new_class, "Mine");
    assert_eq!(set.last_stats().reserved_files, 2);
    Ok(())
}

#[test]
fn test_custom_reserved_subtree() -> Result<()> {
    let (_temp_dir, handle) = create_test_mod()?;
    write_mod_file(&handle.path, "Src/Core/Classes/Object.uc", &listener_source(&["UIShell"]))?;
    write_mod_file(&handle.path, "Src/MyMod/Classes/Mine.uc", &listener_source(&["UIShell"]))?;

    let options = ScanOptions {
        reserved_subtrees: vec!["XComGame".to_string(), "core".to_string()],
        ..ScanOptions::default()
    };
    let overrides = OverrideSet::new(handle, &options).get(false)?;

    assert_eq!(overrides.len(), 1);
    Ok(())
}

#[test]
fn test_parallel_scan_loses_nothing() -> Result<()> {
    let (_temp_dir, handle) = create_test_mod()?;
    for i in 0..150 {
        write_mod_file(
            &handle.path,
            &format!("Src/MyMod/Classes/Group{}/Listener{}.uc", i % 7, i),
            &listener_source(&["UIShell", "UIArmory_Loadout"]),
        )?;
    }

    let options = ScanOptions {
        parallel_threads: Some(4),
        ..ScanOptions::default()
    };
    let set = OverrideSet::new(handle, &options);

    let first = set.get(false)?;
    assert_eq!(first.len(), 300);

    for _ in 0..3 {
        let again = set.get(true)?;
        assert_eq!(sorted_pairs(&again), sorted_pairs(&first));
    }
    Ok(())
}

#[test]
fn test_cancelled_refresh_is_not_cached() -> Result<()> {
    let (_temp_dir, handle) = create_test_mod()?;
    write_mod_file(&handle.path, "Src/MyMod/Classes/First.uc", &listener_source(&["UIShell"]))?;

    let set = OverrideSet::with_defaults(handle);
    let partial = set.get_with_cancel(false, &AtomicBool::new(true))?;

    assert!(partial.is_empty());
    assert!(!set.is_populated());
    assert_eq!(set.get(false)?.len(), 1);
    Ok(())
}

#[test]
fn test_concurrent_get_from_rayon_tasks() -> Result<()> {
    let (_temp_dir, handle) = create_test_mod()?;
    for i in 0..200 {
        write_mod_file(
            &handle.path,
            &format!("Src/MyMod/Classes/Listener{}.uc", i),
            &listener_source(&["UIShell"]),
        )?;
    }

    let options = ScanOptions {
        parallel_threads: Some(2),
        ..ScanOptions::default()
    };
    let set = OverrideSet::new(Arc::clone(&handle), &options);

    let counts: Vec<usize> = (0..64)
        .into_par_iter()
        .map(|i| set.get(i % 16 == 0).map(|overrides| overrides.len()))
        .collect::<Result<_>>()?;

    assert!(counts.iter().all(|&count| count == 200));
    assert!(Arc::ptr_eq(set.mod_handle(), &handle));
    assert_eq!(set.last_stats().total_overrides(), 200);
    Ok(())
}
