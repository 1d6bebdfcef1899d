//! End-to-end scenarios driving the built `glintc` binary, per §8 of the
//! design document this crate implements.

use assert_cmd::Command;
use predicates::str::contains;
use std::io::Write;
use tempfile::NamedTempFile;

fn glintc() -> Command {
    Command::cargo_bin("glintc").unwrap()
}

fn script(src: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(src.as_bytes()).unwrap();
    f
}

#[test]
fn prints_sum_of_two_literals() {
    glintc()
        .args(["-e", "print 1 + 2;"])
        .assert()
        .success()
        .stdout(contains("3"));
}

#[test]
fn compound_assign_then_print() {
    glintc()
        .args(["-e", "a = 3; a += 4; print a;"])
        .assert()
        .success()
        .stdout(contains("7"));
}

#[test]
fn string_plus_int_coerces_numerically() {
    glintc()
        .args(["-e", "a = \"10\"; print a + 5;"])
        .assert()
        .success()
        .stdout(contains("15"));
}

#[test]
fn array_literal_and_index() {
    glintc()
        .args(["-e", "a = {10, 20, 30}; print a[1];"])
        .assert()
        .success()
        .stdout(contains("20"));
}

#[test]
fn post_increment_prints_preimage_then_new_value() {
    glintc()
        .args(["-e", "a = 3; print a++; print a;"])
        .assert()
        .success()
        .stdout(contains("3").and(contains("4")));
}

#[test]
fn short_circuit_or_runs_then_branch() {
    glintc()
        .args(["-e", "if (0 || \"hi\") print \"yes\";"])
        .assert()
        .success()
        .stdout(contains("yes"));
}

#[test]
fn len_prefix_across_types() {
    glintc()
        .args(["-e", "print #\"abc\", #123, #{1,2,3,4};"])
        .assert()
        .success()
        .stdout(contains("3 3 4"));
}

#[test]
fn runs_a_script_file_from_disk() {
    let f = script("print 41 + 1;");
    glintc()
        .arg(f.path())
        .assert()
        .success()
        .stdout(contains("42"));
}

#[test]
fn unterminated_block_comment_is_a_fatal_error() {
    glintc()
        .args(["-e", "/* unterminated"])
        .assert()
        .failure();
}

#[test]
fn missing_script_and_eval_is_an_error() {
    glintc().assert().failure();
}
