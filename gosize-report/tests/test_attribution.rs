use gosize_pclntab::LineTable;
use gosize_report::{attribute, write_sql, What};
use gosize_testutils::{pcvalue_bytes, FuncFixture, Gen, PclntabBuilder};

fn one_func_v12() -> Vec<u8> {
    let mut main_fn = FuncFixture::new("main.main", 0);
    main_fn.pcsp = pcvalue_bytes(&[(8, 90)]);
    main_fn.pcfile = pcvalue_bytes(&[(1, 90)]);
    main_fn.pcln = pcvalue_bytes(&[(5, 90)]);
    PclntabBuilder::new(Gen::V12)
        .end_pc(100)
        .func(main_fn)
        .build()
}

#[test]
fn test_attribution_rows() {
    let buf = one_func_v12();
    let table = LineTable::parse(&buf, 0).unwrap();
    let funcs = table.functions().unwrap();
    let rows = attribute(&table, &funcs, 1000);

    // Each 3-byte value table is two varint pairs' worth of deltas plus the
    // terminator; the descriptor is a pointer plus eight 4-byte fields.
    let expected = [
        ("main.main", "main", What::FixedHeader, 40),
        ("main.main", "main", What::PcSp, 3),
        ("main.main", "main", What::PcFile, 3),
        ("main.main", "main", What::PcLn, 3),
        ("main.main", "main", What::Text, 100),
        ("main.main", "main", What::FuncName, 10),
        ("", "", What::Todo, 841),
    ];
    assert_eq!(rows.len(), expected.len());
    for (row, (name, package, what, size)) in rows.iter().zip(expected) {
        assert_eq!(
            (row.name.as_str(), row.package.as_str(), row.what, row.size),
            (name, package, what, size)
        );
    }
}

#[test]
fn test_sizes_sum_to_binary_size() {
    let buf = one_func_v12();
    let table = LineTable::parse(&buf, 0).unwrap();
    let funcs = table.functions().unwrap();
    for binary_size in [1000, 160, 0] {
        let rows = attribute(&table, &funcs, binary_size);
        assert_eq!(rows.iter().map(|r| r.size).sum::<i64>(), binary_size);
    }
}

#[test]
fn test_attribution_is_deterministic() {
    let buf = one_func_v12();
    let table = LineTable::parse(&buf, 0).unwrap();
    let funcs = table.functions().unwrap();
    assert_eq!(
        attribute(&table, &funcs, 1000),
        attribute(&table, &funcs, 1000)
    );
}

#[test]
fn test_funcdata_and_pcdata_rows() {
    let mut main_fn = FuncFixture::new("main.main", 0);
    main_fn.num_funcdata = 2;
    main_fn.pcdata = vec![pcvalue_bytes(&[(1, 90)]), Vec::new()];
    let buf = PclntabBuilder::new(Gen::V12)
        .end_pc(100)
        .func(main_fn)
        .build();
    let table = LineTable::parse(&buf, 0).unwrap();
    let funcs = table.functions().unwrap();
    let rows = attribute(&table, &funcs, 1000);

    let size_of = |what: What| {
        rows.iter()
            .find(|r| r.what == what)
            .map(|r| r.size)
            .unwrap_or(0)
    };
    assert_eq!(size_of(What::FuncData), 16);
    assert_eq!(size_of(What::PcData(0)), 4 + 3);
    // An absent pcdata table still costs its descriptor offset slot.
    assert_eq!(size_of(What::PcData(1)), 4);
    // No auxiliary tables were present at all.
    assert_eq!(size_of(What::PcSp), 0);
}

#[test]
fn test_no_functions() {
    let buf = PclntabBuilder::new(Gen::V116).build();
    let table = LineTable::parse(&buf, 0).unwrap();
    let funcs = table.functions().unwrap();
    let rows = attribute(&table, &funcs, 500);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].what, What::Todo);
    assert_eq!(rows[0].size, 500);
}

#[test]
fn test_fixed_header_by_generation() {
    for (gen, text_start, fixed) in [
        (Gen::V12, 0u64, 40),
        (Gen::V116, 0, 44),
        (Gen::V120, 0x40_0000, 48),
    ] {
        let main_fn = FuncFixture::new("main.main", text_start + 0x1000);
        let buf = PclntabBuilder::new(gen)
            .text_start(text_start)
            .end_pc(text_start + 0x1040)
            .func(main_fn)
            .build();
        let table = LineTable::parse(&buf, 0).unwrap();
        let funcs = table.functions().unwrap();
        let rows = attribute(&table, &funcs, 10_000);
        assert_eq!(rows[0].what, What::FixedHeader);
        assert_eq!(rows[0].size, fixed, "fixed header for {gen:?}");
    }
}

#[test]
fn test_sql_report() {
    let buf = one_func_v12();
    let table = LineTable::parse(&buf, 0).unwrap();
    let funcs = table.functions().unwrap();
    let rows = attribute(&table, &funcs, 1000);
    let mut out = Vec::new();
    write_sql(&mut out, &rows).unwrap();
    insta::assert_snapshot!(String::from_utf8(out).unwrap(), @r###"
    DROP TABLE IF EXISTS Bin;
    CREATE TABLE Bin (Func varchar, Pkg varchar, What varchar, Size int64);
    BEGIN TRANSACTION;
    INSERT INTO Bin VALUES ('main.main', 'main', "fixedheader", 40);
    INSERT INTO Bin VALUES ('main.main', 'main', "pcsp", 3);
    INSERT INTO Bin VALUES ('main.main', 'main', "pcfile", 3);
    INSERT INTO Bin VALUES ('main.main', 'main', "pcln", 3);
    INSERT INTO Bin VALUES ('main.main', 'main', "text", 100);
    INSERT INTO Bin VALUES ('main.main', 'main', "funcname", 10);
    INSERT INTO Bin (What, Size) VALUES ('TODO', 841);
    END TRANSACTION;
    "###);
}
