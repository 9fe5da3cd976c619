use gosize_pclntab::{FormatErrorKind, LineTable};
use gosize_testutils::{pcvalue_bytes, FuncFixture, Gen, PclntabBuilder};

/// One function at [0x1000, 0x1040) in /src/main.go, lines 9 and 11, plus a
/// second function at [0x1040, 0x1060) in /src/other.go.
fn program(gen: Gen) -> Vec<u8> {
    // File numbers are 1-based slots in the 1.2 layout and compilation
    // unit indices in the later ones.
    let (first_file, second_file) = match gen {
        Gen::V12 => (1, 2),
        _ => (0, 1),
    };

    let mut main_fn = FuncFixture::new("main.main", 0x1000);
    main_fn.pcfile = pcvalue_bytes(&[(first_file + 1, 0x40)]);
    main_fn.pcln = pcvalue_bytes(&[(10, 0x10), (2, 0x20)]);

    let mut other = FuncFixture::new("main.other", 0x1040);
    other.pcfile = pcvalue_bytes(&[(second_file + 1, 0x20)]);
    other.pcln = pcvalue_bytes(&[(31, 0x10)]);

    PclntabBuilder::new(gen)
        .end_pc(0x1060)
        .func(main_fn)
        .func(other)
        .file("/src/main.go")
        .file("/src/other.go")
        .build()
}

#[test]
fn test_func_for_pc() {
    for gen in [Gen::V12, Gen::V116, Gen::V120] {
        let buf = program(gen);
        let table = LineTable::parse(&buf, 0).unwrap();

        let main_fn = table.func_for_pc(0x1005).unwrap().unwrap();
        assert_eq!(main_fn.name, "main.main");
        assert_eq!(main_fn.entry, 0x1000);
        assert_eq!(main_fn.end, 0x1040);
        // Both boundaries of the second function.
        assert_eq!(table.func_for_pc(0x1040).unwrap().unwrap().name, "main.other");
        assert_eq!(table.func_for_pc(0x105F).unwrap().unwrap().name, "main.other");

        assert!(table.func_for_pc(0xFFF).unwrap().is_none());
        assert!(table.func_for_pc(0x1060).unwrap().is_none());
    }
}

#[test]
fn test_pc_to_line() {
    for gen in [Gen::V12, Gen::V116, Gen::V120] {
        let buf = program(gen);
        let table = LineTable::parse(&buf, 0).unwrap();
        assert_eq!(table.pc_to_line(0x1000).unwrap(), 9);
        assert_eq!(table.pc_to_line(0x100F).unwrap(), 9);
        assert_eq!(table.pc_to_line(0x1010).unwrap(), 11);
        assert_eq!(table.pc_to_line(0x1040).unwrap(), 30);
    }
}

#[test]
fn test_pc_to_line_uncovered() {
    let buf = program(Gen::V12);
    let table = LineTable::parse(&buf, 0).unwrap();
    // Past the end-of-text sentinel.
    assert_eq!(
        table.pc_to_line(0x2000).unwrap_err().kind(),
        FormatErrorKind::UnknownLine
    );
    // Inside the function but past its line table.
    assert_eq!(
        table.pc_to_line(0x1030).unwrap_err().kind(),
        FormatErrorKind::UnknownLine
    );
}

#[test]
fn test_pc_to_file() {
    for gen in [Gen::V12, Gen::V116, Gen::V120] {
        let buf = program(gen);
        let table = LineTable::parse(&buf, 0).unwrap();
        assert_eq!(table.pc_to_file(0x1005).unwrap(), "/src/main.go");
        assert_eq!(table.pc_to_file(0x1045).unwrap(), "/src/other.go");
        assert_eq!(
            table.pc_to_file(0x2000).unwrap_err().kind(),
            FormatErrorKind::UnknownFile
        );
    }
}

#[test]
fn test_line_to_pc() {
    for gen in [Gen::V12, Gen::V116, Gen::V120] {
        let buf = program(gen);
        let table = LineTable::parse(&buf, 0).unwrap();
        assert_eq!(table.line_to_pc("/src/main.go", 9).unwrap(), 0x1000);
        assert_eq!(table.line_to_pc("/src/main.go", 11).unwrap(), 0x1010);
        assert_eq!(table.line_to_pc("/src/other.go", 30).unwrap(), 0x1040);

        assert_eq!(
            table.line_to_pc("/src/absent.go", 9).unwrap_err().kind(),
            FormatErrorKind::UnknownFile
        );
        assert_eq!(
            table.line_to_pc("/src/main.go", 999).unwrap_err().kind(),
            FormatErrorKind::UnknownLine
        );
    }
}
