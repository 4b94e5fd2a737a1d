use std::cmp::Ordering;

use avl_threaded::Tree;
use tracing_subscriber::EnvFilter;

fn by_length(a: &&str, b: &&str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut tree = Tree::with_comparator(by_length);
    for word in ["pear", "fig", "banana", "kiwi", "apple", "fig", "cherry"] {
        if let Some(old) = tree.insert(word) {
            tracing::info!(word = old, "replaced");
        }
    }
    tracing::info!(len = tree.len(), height = tree.height(), "built tree");

    println!("Shortest first:");
    let mut node = tree.min();
    while let Some(n) = node {
        println!("  {}", n.value());
        node = n.next();
    }

    println!("Longest first:");
    let mut node = tree.max();
    while let Some(n) = node {
        println!("  {}", n.value());
        node = n.prev();
    }

    tree.remove(&"kiwi");
    println!("After removing kiwi: {tree:?}");
}
