use dbgp::{
    BreakpointStore, DbgpError, SledStore,
    command::{Breakpoint, HitCondition, State, Target},
};
use tempfile::TempDir;

fn exception(name: &str) -> Breakpoint {
    Breakpoint::new(Target::Exception {
        exception: name.to_string(),
    })
}

// Should get previously stored breakpoints.
#[test]
fn get_stored_breakpoint() -> dbgp::Result<()> {
    let temp_dir = TempDir::new().expect("unable to create temporary working directory");
    let store = SledStore::open(temp_dir.path())?;

    let mut conditional = Breakpoint::new(Target::Conditional {
        file: "cart.php".to_string(),
        line: 41,
        expression: "$total > 100".to_string(),
    });
    conditional.state = State::Disabled;
    conditional.hit = Some((3, HitCondition::Multiple));

    store.set("cond".to_string(), conditional.clone())?;
    store.set("ex".to_string(), exception("RuntimeException"))?;

    assert_eq!(store.get("cond")?, Some(conditional));
    assert_eq!(store.get("missing")?, None);
    Ok(())
}

// Should survive reopening the database.
#[test]
fn persists_across_reopen() -> dbgp::Result<()> {
    let temp_dir = TempDir::new().expect("unable to create temporary working directory");
    {
        let store = SledStore::open(temp_dir.path())?;
        store.set("b".to_string(), exception("B"))?;
        store.set("a".to_string(), exception("A"))?;
        store.set("a".to_string(), exception("A2"))?;
    }

    let store = SledStore::open(temp_dir.path())?;
    let listed = store.list()?;
    assert_eq!(
        listed,
        vec![
            ("a".to_string(), exception("A2")),
            ("b".to_string(), exception("B")),
        ]
    );
    Ok(())
}

#[test]
fn remove_breakpoint() -> dbgp::Result<()> {
    let temp_dir = TempDir::new().expect("unable to create temporary working directory");
    let store = SledStore::open(temp_dir.path())?;
    store.set("a".to_string(), exception("A"))?;
    store.remove("a")?;
    assert_eq!(store.get("a")?, None);
    assert!(matches!(
        store.remove("a"),
        Err(DbgpError::NonExistentBreakpoint(key)) if key == "a"
    ));
    Ok(())
}
