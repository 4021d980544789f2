use maglev_table::Maglev;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use test_log::test;

#[test]
fn maglev_concurrent_lookup() -> maglev_table::Result<()> {
    let maglev = Maglev::new(16, 1_009)?;
    maglev.build()?;

    let stop = Arc::new(AtomicBool::new(false));

    let readers = (0..4)
        .map(|_| {
            let maglev = maglev.clone();
            let stop = stop.clone();

            std::thread::spawn(move || {
                let mut lookups = 0usize;

                while !stop.load(Ordering::Relaxed) {
                    // A published table is always complete
                    let table = maglev.table();
                    assert!(table.is_complete());

                    assert!(maglev.lookup(lookups.to_be_bytes()).is_some());
                    lookups += 1;
                }

                lookups
            })
        })
        .collect::<Vec<_>>();

    for round in 0..200u32 {
        let node = round % 16;
        maglev.down(node)?;
        maglev.build()?;
        maglev.up(node)?;
        maglev.build()?;
    }

    stop.store(true, Ordering::Relaxed);

    for reader in readers {
        let lookups = reader.join().expect("reader should not panic");
        assert!(lookups > 0);
    }

    Ok(())
}

#[test]
fn maglev_concurrent_builds() -> maglev_table::Result<()> {
    let maglev = Maglev::new(8, 97)?;
    maglev.down(3)?;

    let builders = (0..4)
        .map(|_| {
            let maglev = maglev.clone();
            std::thread::spawn(move || maglev.build())
        })
        .collect::<Vec<_>>();

    let tables = builders
        .into_iter()
        .map(|builder| builder.join().expect("builder should not panic"))
        .collect::<maglev_table::Result<Vec<_>>>()?;

    for table in &tables {
        assert_eq!(**table, *maglev.table());
    }

    Ok(())
}
