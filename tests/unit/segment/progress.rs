use super::*;

#[test]
fn percentages_never_go_backwards() {
    let mut seen = Vec::new();
    let mut sink = |step: &str, p: u8| seen.push((step.to_owned(), p));
    let mut progress = ProgressReporter::new(&mut sink);
    progress.report("a", 10);
    progress.report("b", 5);
    progress.report("c", 250);
    progress.report("d", 40);
    assert_eq!(progress.last(), 100);
    drop(progress);

    let values: Vec<u8> = seen.iter().map(|(_, p)| *p).collect();
    assert_eq!(values, vec![10, 10, 100, 100]);
    assert_eq!(seen[1].0, "b");
}
