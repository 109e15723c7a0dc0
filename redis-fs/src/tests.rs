use crate::error::{FsError, Result};
use crate::inode::InodeKind;
use crate::pattern::Glob;
use crate::search::TypeFilter;
use crate::volume::{Follow, Volume};
use crate::{bloom, line, path};

const T0: i64 = 1_000;

fn new_volume() -> Volume {
    Volume::new(T0)
}

// === path ===

#[test]
fn normalize_collapses_messy_paths() -> Result<()> {
    assert_eq!(path::normalize(b"/")?, Vec::<String>::new());
    assert_eq!(path::normalize(b"//")?, Vec::<String>::new());
    assert_eq!(path::normalize(b"/./")?, Vec::<String>::new());
    assert_eq!(path::normalize(b"//a//b//c.txt")?, ["a", "b", "c.txt"]);
    assert_eq!(path::normalize(b"/a/./b/./c.txt")?, ["a", "b", "c.txt"]);
    assert_eq!(path::normalize(b"/a/b/x/../c.txt")?, ["a", "b", "c.txt"]);
    assert_eq!(path::normalize(b"/../../a")?, ["a"]);
    assert_eq!(path::normalize(b"/a/b/")?, ["a", "b"]);
    Ok(())
}

#[test]
fn normalize_rejects_relative_and_non_utf8() {
    assert_eq!(path::normalize(b"relative/p"), Err(FsError::InvalidPath));
    assert_eq!(path::normalize(b""), Err(FsError::InvalidPath));
    assert_eq!(path::normalize(b"/a/\xff\xfe"), Err(FsError::InvalidPath));
}

#[test]
fn normalize_enforces_depth_limit() {
    let deep = "/d".repeat(path::MAX_PATH_DEPTH);
    assert_eq!(
        path::normalize(deep.as_bytes()).map(|p| p.len()),
        Ok(path::MAX_PATH_DEPTH)
    );
    let over = "/d".repeat(path::MAX_PATH_DEPTH + 1);
    assert_eq!(path::normalize(over.as_bytes()), Err(FsError::DepthExceeded));
}

#[test]
fn expand_target_handles_relative_and_absolute() -> Result<()> {
    let base = vec!["a".to_string(), "b".to_string()];
    assert_eq!(path::expand_target(&base, "c")?, ["a", "b", "c"]);
    assert_eq!(path::expand_target(&base, "../c")?, ["a", "c"]);
    assert_eq!(path::expand_target(&base, "/x/y")?, ["x", "y"]);
    Ok(())
}

// === line ===

#[test]
fn head_stops_before_the_nth_newline() {
    assert_eq!(line::head(b"A\nB\nC\n", 2), b"A\nB");
    assert_eq!(line::head(b"A\nB\nC\n", 10), b"A\nB\nC\n");
    assert_eq!(line::head(b"only one", 10), b"only one");
    assert_eq!(line::head(b"A\nB", 0), b"");
    assert_eq!(line::head(b"", 5), b"");
}

#[test]
fn tail_keeps_terminators() {
    assert_eq!(line::tail(b"A\nB\nC\n", 2), b"B\nC\n");
    assert_eq!(line::tail(b"A\nB\nC", 2), b"B\nC");
    assert_eq!(line::tail(b"A\nB\nC", 10), b"A\nB\nC");
    assert_eq!(line::tail(b"only one", 10), b"only one");
    assert_eq!(line::tail(b"A\nB", 0), b"");
    assert_eq!(line::tail(b"", 3), b"");
}

#[test]
fn slice_range_clamps_and_empties() {
    let content = b"one\ntwo\nthree";
    assert_eq!(line::slice_range(content, 2, Some(3)), b"two\nthree");
    assert_eq!(line::slice_range(content, 1, Some(1)), b"one");
    assert_eq!(line::slice_range(content, 2, Some(100)), b"two\nthree");
    assert_eq!(line::slice_range(content, 100, Some(200)), b"");
    assert_eq!(line::slice_range(content, 1, None), content);
    assert_eq!(line::slice_range(b"", 1, Some(10)), b"");
}

#[test]
fn insert_positions() {
    assert_eq!(line::insert(b"line 1\nline 2", 1, b"x"), b"line 1\nx\nline 2");
    assert_eq!(line::insert(b"line 1\nline 2", 0, b"x"), b"x\nline 1\nline 2");
    assert_eq!(line::insert(b"line 1\nline 2", -1, b"x"), b"line 1\nline 2\nx");
    assert_eq!(line::insert(b"line 1\nline 2", 100, b"x"), b"line 1\nline 2\nx");
    assert_eq!(line::insert(b"", 0, b"first"), b"first");
    assert_eq!(line::insert(b"A\nB", 1, b"X\nY\nZ"), b"A\nX\nY\nZ\nB");
}

#[test]
fn delete_preserves_boundary_newlines() {
    assert_eq!(line::delete(b"A\nB\nC", 3, 3), (b"A\nB\n".to_vec(), 1));
    assert_eq!(line::delete(b"A\nB\nC", 2, 2), (b"A\nC".to_vec(), 1));
    assert_eq!(line::delete(b"A\nB\nC", 2, 100), (b"A\n".to_vec(), 2));
    assert_eq!(line::delete(b"A\nB\nC", 1, 3), (b"".to_vec(), 3));
    assert_eq!(line::delete(b"A\nB", 100, 200), (b"A\nB".to_vec(), 0));
    assert_eq!(line::delete(b"only one", 1, 1), (b"".to_vec(), 1));
}

#[test]
fn counts_lines_words_chars() {
    assert_eq!(line::counts(b"hello world\nfoo bar baz\n"), (2, 5, 24));
    assert_eq!(line::counts(b""), (0, 0, 0));
    assert_eq!(line::counts(b"hello world"), (1, 2, 11));
    assert_eq!(line::counts(b"a\tb\tc"), (1, 3, 5));
    assert_eq!(line::counts(b"   \n\t\n  "), (3, 0, 8));
}

#[test]
fn replace_first_all_and_band() {
    assert_eq!(
        line::replace(b"foo bar foo baz foo", b"foo", b"X", None, false),
        (b"X bar foo baz foo".to_vec(), 1)
    );
    assert_eq!(
        line::replace(b"foo bar foo baz foo", b"foo", b"X", None, true),
        (b"X bar X baz X".to_vec(), 3)
    );
    let content = b"line 1 foo\nline 2 foo\nline 3 foo\nline 4 foo";
    assert_eq!(
        line::replace(content, b"foo", b"BAR", Some((2, 3)), false),
        (b"line 1 foo\nline 2 BAR\nline 3 foo\nline 4 foo".to_vec(), 1)
    );
    assert_eq!(
        line::replace(content, b"foo", b"BAR", Some((2, 3)), true),
        (b"line 1 foo\nline 2 BAR\nline 3 BAR\nline 4 foo".to_vec(), 2)
    );
    assert_eq!(
        line::replace(b"hello\nworld", b"hello\nworld", b"bye", None, false),
        (b"bye".to_vec(), 1)
    );
}

// === pattern and bloom ===

#[test]
fn glob_matching_basics() -> Result<()> {
    assert!(Glob::compile(b"*.txt", false)?.matches("foo.txt"));
    assert!(!Glob::compile(b"*.txt", false)?.matches("foo.log"));
    assert!(Glob::compile(b"???.txt", false)?.matches("bar.txt"));
    assert!(Glob::compile(b"[fb]*.txt", false)?.matches("foo.txt"));
    assert!(Glob::compile(b"a[0-9]c", false)?.matches("a1c"));
    assert!(Glob::compile(b"a[!0-9]c", false)?.matches("a-c"));
    assert!(!Glob::compile(b"a[!0-9]c", false)?.matches("a1c"));
    assert!(Glob::compile(b"abc", false)?.matches("abc"));
    assert!(Glob::compile(b"*HELLO*", true)?.matches("say hello there"));
    assert!(!Glob::compile(b"hello", false)?.matches("Hello"));
    Ok(())
}

#[test]
fn literal_grams_skip_wildcards_and_classes() -> Result<()> {
    let grams = Glob::compile(b"*Hello*", false)?.literal_grams();
    assert_eq!(grams, vec![b"hel".to_vec(), b"ell".to_vec(), b"llo".to_vec()]);
    // Class members never leak into literal runs.
    assert!(Glob::compile(b"[abcdef]??", false)?.literal_grams().is_empty());
    assert!(Glob::compile(b"[!]]abc*", false)?
        .literal_grams()
        .contains(&b"abc".to_vec()));
    assert!(Glob::compile(b"ab?cd", false)?.literal_grams().is_empty());
    Ok(())
}

#[test]
fn content_index_never_misses() {
    let content = b"The quick Brown Fox\njumps over the lazy dog";
    let index = bloom::ContentIndex::build(content);
    let lowered: Vec<u8> = content.iter().map(|b| b.to_ascii_lowercase()).collect();
    for gram in lowered.windows(bloom::GRAM_LEN) {
        assert!(index.may_contain(gram));
    }
    // Content shorter than a gram indexes nothing, so every probe misses.
    let tiny = bloom::ContentIndex::build(b"ab");
    assert!(!tiny.may_contain(b"abc"));
}

// === volume ===

#[test]
fn write_then_cat_round_trips() -> Result<()> {
    let mut v = new_volume();
    v.write(b"/a/b/c.txt", b"data", false, T0)?;
    assert_eq!(v.cat(b"//a/./b/../b/c.txt")?, b"data");
    assert!(v.exists(b"/a/b")?);
    assert_eq!(v.cat(b"/missing"), Err(FsError::NotFound));
    Ok(())
}

#[test]
fn write_to_root_or_directory_fails() -> Result<()> {
    let mut v = new_volume();
    assert_eq!(v.write(b"/", b"x", false, T0), Err(FsError::InvalidPath));
    v.mkdir(b"/d", false, T0)?;
    assert_eq!(v.write(b"/d", b"x", false, T0), Err(FsError::NotAFile));
    Ok(())
}

#[test]
fn mkdir_and_ls() -> Result<()> {
    let mut v = new_volume();
    v.mkdir(b"/a/b/c", true, T0)?;
    assert_eq!(v.ls(b"/a")?, ["b"]);
    assert_eq!(v.mkdir(b"/a/b/c", true, T0), Ok(()));
    assert_eq!(v.mkdir(b"/a/b/c", false, T0), Err(FsError::Exists));
    assert_eq!(v.mkdir(b"/x/y/z", false, T0), Err(FsError::NotFound));
    v.write(b"/f", b"", false, T0)?;
    assert_eq!(v.mkdir(b"/f", true, T0), Err(FsError::NotADirectory));
    Ok(())
}

#[test]
fn symlink_resolution_follows_and_stops() -> Result<()> {
    let mut v = new_volume();
    v.write(b"/f.txt", b"hello", false, T0)?;
    v.ln(b"/f.txt", b"/l", T0)?;
    v.ln(b"/l", b"/m", T0)?;
    v.ln(b"/m", b"/n", T0)?;
    assert_eq!(v.cat(b"/n")?, b"hello");
    assert_eq!(v.readlink(b"/n")?, b"/m");
    assert_eq!(v.stat(b"/n")?.kind, InodeKind::Symlink);
    // Relative target resolves against the link's directory.
    v.mkdir(b"/sub", false, T0)?;
    v.write(b"/sub/data", b"inner", false, T0)?;
    v.ln(b"data", b"/sub/rel", T0)?;
    assert_eq!(v.cat(b"/sub/rel")?, b"inner");
    // Dangling target reads as absent.
    v.ln(b"/nope", b"/dangling", T0)?;
    assert_eq!(v.cat(b"/dangling"), Err(FsError::NotFound));
    assert!(v.exists(b"/dangling")?);
    Ok(())
}

#[test]
fn symlink_loops_and_hop_budget() -> Result<()> {
    let mut v = new_volume();
    v.ln(b"/selfloop", b"/selfloop", T0)?;
    assert_eq!(v.cat(b"/selfloop"), Err(FsError::SymlinkLoop));
    v.ln(b"/loopB", b"/loopA", T0)?;
    v.ln(b"/loopA", b"/loopB", T0)?;
    assert_eq!(v.cat(b"/loopA"), Err(FsError::SymlinkLoop));

    v.write(b"/target", b"reached", false, T0)?;
    let mut prev = "/target".to_string();
    for i in 0..39 {
        let link = format!("/chain{}", i);
        v.ln(prev.as_bytes(), link.as_bytes(), T0)?;
        prev = link;
    }
    // 39 hops resolve.
    assert_eq!(v.cat(prev.as_bytes())?, b"reached");
    v.ln(prev.as_bytes(), b"/over", T0)?;
    assert_eq!(v.cat(b"/over"), Err(FsError::SymlinkLoop));
    Ok(())
}

#[test]
fn rm_recursive_drops_whole_subtree() -> Result<()> {
    let mut v = new_volume();
    v.write(b"/tree/a/1.txt", b"1", false, T0)?;
    v.write(b"/tree/a/2.txt", b"2", false, T0)?;
    v.write(b"/tree/b/3.txt", b"3", false, T0)?;
    assert_eq!(v.rm(b"/tree", false, T0), Err(FsError::NotEmpty));
    assert_eq!(v.rm(b"/tree", true, T0)?, 1);
    assert!(!v.exists(b"/tree")?);
    assert!(!v.exists(b"/tree/a/1.txt")?);
    assert_eq!(v.info().total_inodes, 1);
    assert!(v.is_vacant());
    assert_eq!(v.rm(b"/tree", false, T0)?, 0);
    assert_eq!(v.rm(b"/", false, T0), Err(FsError::InvalidPath));
    Ok(())
}

#[test]
fn cp_preserves_metadata() -> Result<()> {
    let mut v = new_volume();
    v.write(b"/src.txt", b"payload", false, T0)?;
    v.chmod(b"/src.txt", 0o601, T0)?;
    v.chown(b"/src.txt", 12, Some(34), T0)?;
    v.utimens(b"/src.txt", 1111, 2222, T0)?;
    v.cp(b"/src.txt", b"/dst.txt", false, T0 + 5)?;
    let src = v.stat(b"/src.txt")?;
    let dst = v.stat(b"/dst.txt")?;
    assert_eq!(src, dst);
    assert_eq!(v.cat(b"/dst.txt")?, b"payload");
    assert_eq!(v.cp(b"/src.txt", b"/dst.txt", false, T0), Err(FsError::Exists));

    v.mkdir(b"/d/sub", true, T0)?;
    v.write(b"/d/sub/f", b"x", false, T0)?;
    assert!(matches!(
        v.cp(b"/d", b"/d2", false, T0),
        Err(FsError::InvalidArgument(_))
    ));
    v.cp(b"/d", b"/d2", true, T0)?;
    assert_eq!(v.cat(b"/d2/sub/f")?, b"x");
    Ok(())
}

#[test]
fn mv_refuses_own_subtree() -> Result<()> {
    let mut v = new_volume();
    v.write(b"/a/file.txt", b"payload", false, T0)?;
    assert!(matches!(
        v.mv(b"/a", b"/a/sub/new", T0),
        Err(FsError::InvalidArgument(_))
    ));
    assert!(v.exists(b"/a/file.txt")?);
    v.mv(b"/a", b"/b", T0)?;
    assert_eq!(v.cat(b"/b/file.txt")?, b"payload");
    assert!(!v.exists(b"/a")?);
    Ok(())
}

#[test]
fn find_matches_basenames_with_type_filter() -> Result<()> {
    let mut v = new_volume();
    v.write(b"/a.txt", b"a", false, T0)?;
    v.write(b"/b.log", b"b", false, T0)?;
    v.write(b"/sub/c.txt", b"c", false, T0)?;
    v.mkdir(b"/sub/data", false, T0)?;
    let hits = v.find(b"/", b"*.txt", None)?;
    assert_eq!(hits, ["/a.txt", "/sub/c.txt"]);
    let dirs = v.find(b"/", b"data", Some(TypeFilter::Dir))?;
    assert_eq!(dirs, ["/sub/data"]);
    assert_eq!(v.find(b"/", b"*.xyz", None)?, Vec::<String>::new());
    Ok(())
}

#[test]
fn grep_scans_lines_and_flags_binaries() -> Result<()> {
    let mut v = new_volume();
    v.write(b"/a.txt", b"Hello World\nfoo bar\nbaz", false, T0)?;
    v.write(b"/sub/c.txt", b"deep hello content\n", false, T0)?;
    v.write(b"/bin.dat", b"start\x00\x00middle hello end", false, T0)?;
    let hits = v.grep(b"/", b"Hello*", false)?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].path, "/a.txt");
    assert_eq!(hits[0].line, 1);
    assert_eq!(hits[0].text, b"Hello World");
    let nocase = v.grep(b"/", b"*hello*", true)?;
    let paths: Vec<&str> = nocase.iter().map(|m| m.path.as_str()).collect();
    assert!(paths.contains(&"/a.txt"));
    assert!(paths.contains(&"/sub/c.txt"));
    assert!(paths.contains(&"/bin.dat"));
    let binary: Vec<_> = nocase.iter().filter(|m| m.path == "/bin.dat").collect();
    assert_eq!(binary[0].text, b"Binary file matches");
    assert_eq!(binary[0].line, 0);
    Ok(())
}

#[test]
fn resolution_mode_matters() -> Result<()> {
    let mut v = new_volume();
    v.write(b"/f", b"x", false, T0)?;
    v.ln(b"/f", b"/l", T0)?;
    let no_follow = v.resolve(&path::normalize(b"/l")?, Follow::NoFollow)?;
    let follow = v.resolve(&path::normalize(b"/l")?, Follow::Terminal)?;
    assert_ne!(no_follow, follow);
    Ok(())
}
