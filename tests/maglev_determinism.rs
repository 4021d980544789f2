use maglev_table::Maglev;
use test_log::test;

#[test]
fn maglev_determinism() -> maglev_table::Result<()> {
    let maglev = Maglev::new(10, 101)?;
    maglev.down(4)?;

    maglev.generate_permutations();
    let a = maglev.build()?;

    maglev.generate_permutations();
    let b = maglev.build()?;

    assert_eq!(*a, *b);

    Ok(())
}

#[test]
fn maglev_determinism_across_instances() -> maglev_table::Result<()> {
    let a = Maglev::new(50, 503)?;
    let b = Maglev::new(50, 503)?;

    for node in [3, 17, 49] {
        a.down(node)?;
        b.down(node)?;
    }

    assert_eq!(*a.build()?, *b.build()?);

    for i in 0..1_000 {
        let key = format!("key-{i}");
        assert_eq!(a.lookup(&key), b.lookup(&key));
    }

    Ok(())
}

#[test]
fn maglev_known_table() -> maglev_table::Result<()> {
    let maglev = Maglev::new(3, 7)?;
    let table = maglev.build()?;

    assert_eq!(
        vec![2, 1, 0, 0, 0, 2, 1],
        table.iter().flatten().collect::<Vec<_>>(),
    );

    Ok(())
}
