use common::Book;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use inventory::{BookStore, LocalChainNetwork};

fn bench_chain_write(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("chain_write");

    for length in [1u32, 3, 5] {
        let replicas = rt.block_on(async {
            let network = LocalChainNetwork::new();
            let replicas = network.spawn_chain(length, BookStore::new).await;
            // Keep the network alive for the duration of the benchmark.
            (network, replicas)
        });

        group.bench_with_input(BenchmarkId::from_parameter(length), &replicas, |b, (_, replicas)| {
            b.to_async(&rt).iter(|| async {
                replicas[0]
                    .update_book(Book::new("B1", "Dune", 5), true)
                    .await
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_tail_read(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (network, replicas) = rt.block_on(async {
        let network = LocalChainNetwork::new();
        let replicas = network
            .spawn_chain(3, || BookStore::with_books(vec![Book::new("B1", "Dune", 5)]))
            .await;
        (network, replicas)
    });

    c.bench_function("get_book_redirected_to_tail", |b| {
        b.to_async(&rt).iter(|| async {
            replicas[0]
                .get_book(common::GetBookRequest {
                    request_id: "B1".to_string(),
                    commit_status: true,
                })
                .await
                .unwrap()
        });
    });

    drop(network);
}

criterion_group!(benches, bench_chain_write, bench_tail_read);
criterion_main!(benches);
