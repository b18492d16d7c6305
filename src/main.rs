use elastic_pool::{Config, PoolInner};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Instant;
use tokio::runtime::Builder;

fn main() {
    let rt = Builder::new_multi_thread().enable_all().build().unwrap();

    rt.block_on(async {
        let pool = PoolInner::with_config(Config {
            queue_capacity: 256,
            min_workers: 8,
            max_workers: 64,
            ..Config::default()
        })
        .unwrap();

        let total = 1_000_000usize;
        let done = Arc::new(AtomicUsize::new(0));
        let now = Instant::now();

        for _ in 0..total {
            let done = done.clone();
            pool.submit(async move {
                done.fetch_add(1, Ordering::Relaxed);
            })
            .await
            .unwrap();
        }

        while done.load(Ordering::Relaxed) < total {
            tokio::task::yield_now().await;
        }

        println!(
            "{} tasks in {:?}, workers={}",
            total,
            now.elapsed(),
            pool.worker_count()
        );
        pool.shutdown().await;
    });
}
