use assert_cmd::Command;
use predicates::prelude::predicate;

#[test]
fn test_scenario() {
    let mut cmd = Command::cargo_bin("roast-tests").unwrap();

    cmd.arg("scenario");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            r#"{"name":"main","percent":100.00,"timeMs":2000,"children":[{"name":"pkg.App.run()","percent":100.00,"timeMs":2000,"children":[{"name":"pkg.App.loop()","percent":50.00,"timeMs":1000,"children":[]},{"name":"pkg.App.tick()","percent":50.00,"timeMs":1000,"children":[]}]}]}"#,
        ))
        .stdout(predicate::str::contains(
            r#"pkg.App.loop()<span class="percent">50.00%</span><span class="time">1000ms</span>"#,
        ));
}

#[test]
fn test_sample() {
    let mut cmd = Command::cargo_bin("roast-tests").unwrap();

    cmd.arg("sample");
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("state: Stopped"))
        .stderr(predicate::str::contains("ticks: 5"))
        .stdout("main 50ms\n pkg.App.run() 50ms\n  pkg.App.loop() 30ms\n  pkg.App.tick() 20ms\n");
}

#[test]
fn test_concurrent() {
    let mut cmd = Command::cargo_bin("roast-tests").unwrap();

    cmd.arg("concurrent");
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("consistent renders"))
        .stdout(predicate::str::contains("total: 10000ms"));
}
