use clap::Parser;
use ordered_hash::OrderedHashMap;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,

    /// Remove every n-th key after filling, to show freelist reuse.
    #[arg(short = 'r', long = "remove_every", default_value_t = 0)]
    remove_every: usize,
}

fn main() {
    let args = Args::parse();

    println!(
        "Creating OrderedHashMap with target capacity: {}",
        args.target_capacity
    );

    let mut map: OrderedHashMap<u64, u64> = OrderedHashMap::with_capacity(args.target_capacity);

    println!("Actual capacity: {}", map.capacity());
    println!("Filling map with u64 keys...");

    let num_values = map.capacity() as u64;
    for key in 0..num_values {
        map.insert(key, key * key);
    }

    if args.remove_every > 0 {
        let removed = map.remove_where(|k, _| *k % args.remove_every as u64 == 0);
        println!("Removed {} keys", removed);
    }

    println!("Map holds {} entries", map.len());
    println!(
        "Final load factor: {:.2}%",
        (map.len() as f64 / map.capacity() as f64) * 100.0
    );

    let table = map.table();
    table.debug_stats().print();
    table.print_chain_histogram();
}
