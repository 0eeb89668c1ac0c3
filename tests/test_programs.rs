use std::fs::read_to_string;
use std::process::Command;

use assert_cmd::cargo::CommandCargoExt;
use insta::glob;

use iloc::frontend;
use iloc::ir::View;
use iloc::verification::run;

const REGISTER_COUNTS: [usize; 4] = [3, 4, 5, 8];

#[test]
fn allocated_programs_match_source() {
    glob!("programs", "*.iloc", |path| {
        let input = read_to_string(path).expect("Path doesn't exist");
        let source = frontend::parse(&input).expect("program should parse");
        let expected = run(&source, View::Source).expect("source should simulate");
        assert!(!expected.outputs.is_empty(), "{path:?} prints nothing");

        for k in REGISTER_COUNTS {
            let output = Command::cargo_bin(env!("CARGO_PKG_NAME"))
                .unwrap()
                .arg("-k")
                .arg(k.to_string())
                .arg(path)
                .output()
                .expect("Failed to run allocator");

            assert!(
                output.status.success(),
                "allocation failed for {path:?} with k = {k}: {}",
                String::from_utf8_lossy(&output.stderr)
            );

            // allocated code is itself valid ILOC over registers r0..rk-1
            let allocated = frontend::parse(&String::from_utf8_lossy(&output.stdout))
                .expect("allocated code should re-parse");
            assert!(allocated.register_count(View::Source) <= k);
            assert!(allocated.len() >= source.len());

            let actual = run(&allocated, View::Source).expect("allocated code should simulate");
            assert_eq!(actual.outputs, expected.outputs, "{path:?} with k = {k}");
        }
    });
}

#[test]
fn expected_outputs() {
    let cases = [
        ("arith.iloc", vec![47]),
        ("memory.iloc", vec![10, 600]),
        ("shifts.iloc", vec![13]),
        ("pressure.iloc", vec![52, 21]),
        ("redefine.iloc", vec![32]),
    ];

    for (name, outputs) in cases {
        let path = format!("{}/tests/programs/{name}", env!("CARGO_MANIFEST_DIR"));
        let input = read_to_string(&path).expect("Path doesn't exist");
        let block = frontend::parse(&input).unwrap();
        assert_eq!(run(&block, View::Source).unwrap().outputs, outputs, "{name}");
    }
}
