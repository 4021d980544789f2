use maglev_table::Maglev;
use test_log::test;

const NODE_COUNT: u32 = 4_096;
const TABLE_SIZE: u32 = 4_099;

#[test]
fn maglev_add_node() -> maglev_table::Result<()> {
    let maglev = Maglev::new(NODE_COUNT, TABLE_SIZE)?;

    maglev.down(1_118)?;
    let before = maglev.build()?;
    assert!(before.iter().flatten().all(|node| node != 1_118));

    maglev.up(1_118)?;
    let after = maglev.build()?;

    assert_eq!(1, after.iter().flatten().filter(|&node| node == 1_118).count());
    assert_eq!(7, before.diff(&after).len());

    log::info!(
        "consistent rate: {:.4}%",
        before.unchanged_ratio(&after) * 100.0
    );

    Ok(())
}

#[test]
fn maglev_add_node_restores_table() -> maglev_table::Result<()> {
    let maglev = Maglev::new(20, 1_009)?;
    let all_up = maglev.build()?;

    maglev.down(3)?;
    maglev.build()?;

    maglev.up(3)?;
    assert_eq!(*all_up, *maglev.build()?);

    Ok(())
}

#[test]
fn maglev_add_node_takes_fair_share() -> maglev_table::Result<()> {
    let maglev = Maglev::new(20, 1_009)?;

    maglev.down(11)?;
    let before = maglev.build()?;

    maglev.up(11)?;
    let after = maglev.build()?;

    // Every slot of node 11 was ceded to it
    let owned = after.distribution().get(&11).copied().unwrap_or_default();
    let changed = before.diff(&after);

    assert!((50..=51).contains(&owned), "node 11 owns {owned} slots");
    assert!(changed.len() >= owned);
    assert!(changed.len() < 3 * owned, "{} slots changed", changed.len());

    Ok(())
}
