//! `FS.*` argument parsing, routing, and reply formatting.
//!
//! Handlers parse flags into local option state before touching the
//! keyspace, so an argument error can never leave partial mutations behind.
//! Read-style commands turn an unresolved path (or an absent key) into nil;
//! everything else surfaces the typed error.

use log::trace;

use redis_fs::{FsError, Result, TypeFilter, Volume};

use crate::reply::Reply;
use crate::Keyspace;

pub fn execute(ks: &mut Keyspace, argv: &[&[u8]]) -> Result<Reply> {
    let name = match argv.first() {
        Some(n) => String::from_utf8_lossy(n).to_ascii_uppercase(),
        None => return Err(FsError::UnknownCommand(String::new())),
    };
    let args = &argv[1..];
    trace!("dispatch {} ({} args)", name, args.len());
    match name.as_str() {
        "FS.CAT" => cat(ks, args),
        "FS.LINES" => lines(ks, args),
        "FS.HEAD" => head_tail(ks, args, "fs.head", Volume::head),
        "FS.TAIL" => head_tail(ks, args, "fs.tail", Volume::tail),
        "FS.ECHO" => echo(ks, args),
        "FS.APPEND" => append(ks, args),
        "FS.TOUCH" => touch(ks, args),
        "FS.INSERT" => insert(ks, args),
        "FS.REPLACE" => replace(ks, args),
        "FS.DELETELINES" => delete_lines(ks, args),
        "FS.LS" => ls(ks, args),
        "FS.TREE" => tree(ks, args),
        "FS.FIND" => find(ks, args),
        "FS.STAT" => stat(ks, args),
        "FS.TEST" => test(ks, args),
        "FS.READLINK" => readlink(ks, args),
        "FS.WC" => wc(ks, args),
        "FS.MKDIR" => mkdir(ks, args),
        "FS.RM" => rm(ks, args),
        "FS.CP" => cp(ks, args),
        "FS.MV" => mv(ks, args),
        "FS.LN" => ln(ks, args),
        "FS.CHMOD" => chmod(ks, args),
        "FS.CHOWN" => chown(ks, args),
        "FS.TRUNCATE" => truncate(ks, args),
        "FS.UTIMENS" => utimens(ks, args),
        "FS.INFO" => info(ks, args),
        "FS.GREP" => grep(ks, args),
        _ => Err(FsError::UnknownCommand(name)),
    }
}

// === Reading ===

fn cat(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    let (key, path) = two(args, "fs.cat")?;
    read(ks, key, Reply::Nil, |v| {
        nil_on_not_found(v.cat(path).map(Reply::Bulk))
    })
}

fn lines(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    let (start, end) = match args.len() {
        2 => (1, -1),
        4 => (parse_i64(args[2])?, parse_i64(args[3])?),
        _ => return Err(arity("fs.lines")),
    };
    read(ks, args[0], Reply::Nil, |v| {
        nil_on_not_found(v.lines(args[1], start, end).map(Reply::Bulk))
    })
}

fn head_tail(
    ks: &mut Keyspace,
    args: &[&[u8]],
    cmd: &str,
    op: fn(&Volume, &[u8], i64) -> Result<Vec<u8>>,
) -> Result<Reply> {
    let n = match args.len() {
        2 => 10,
        3 => parse_i64(args[2])?,
        _ => return Err(arity(cmd)),
    };
    read(ks, args[0], Reply::Nil, |v| {
        nil_on_not_found(op(v, args[1], n).map(Reply::Bulk))
    })
}

fn wc(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    let (key, path) = two(args, "fs.wc")?;
    read(ks, key, Reply::Nil, |v| {
        nil_on_not_found(v.wc(path).map(|(lines, words, chars)| {
            Reply::field_map(vec![
                ("lines", Reply::Int(lines as i64)),
                ("words", Reply::Int(words as i64)),
                ("chars", Reply::Int(chars as i64)),
            ])
        }))
    })
}

// === Writing ===

fn echo(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    let append = match args.len() {
        3 => false,
        4 if flag(args[3], "APPEND") => true,
        4 => return Err(unknown_option(args[3])),
        _ => return Err(arity("fs.echo")),
    };
    mutate(ks, args[0], |v, now| {
        v.write(args[1], args[2], append, now).map(|_| Reply::Ok)
    })
}

fn append(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    if args.len() != 3 {
        return Err(arity("fs.append"));
    }
    mutate(ks, args[0], |v, now| {
        v.write(args[1], args[2], true, now)
            .map(|size| Reply::Int(size as i64))
    })
}

fn touch(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    let (key, path) = two(args, "fs.touch")?;
    mutate(ks, key, |v, now| v.touch(path, now).map(|_| Reply::Ok))
}

fn insert(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    if args.len() != 4 {
        return Err(arity("fs.insert"));
    }
    let after = parse_i64(args[2])?;
    mutate(ks, args[0], |v, now| {
        v.insert(args[1], after, args[3], now).map(|_| Reply::Ok)
    })
}

// === Editing ===

fn replace(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    if args.len() < 4 {
        return Err(arity("fs.replace"));
    }
    let mut all = false;
    let mut band = None;
    let mut i = 4;
    while i < args.len() {
        if flag(args[i], "ALL") {
            all = true;
            i += 1;
        } else if flag(args[i], "LINE") {
            if i + 2 >= args.len() {
                return Err(arity("fs.replace"));
            }
            band = Some((parse_i64(args[i + 1])?, parse_i64(args[i + 2])?));
            i += 3;
        } else {
            return Err(unknown_option(args[i]));
        }
    }
    mutate(ks, args[0], |v, now| {
        nil_on_not_found(
            v.replace(args[1], args[2], args[3], band, all, now)
                .map(|n| Reply::Int(n as i64)),
        )
    })
}

fn delete_lines(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    if args.len() != 4 {
        return Err(arity("fs.deletelines"));
    }
    let start = parse_i64(args[2])?;
    let end = parse_i64(args[3])?;
    mutate(ks, args[0], |v, now| {
        nil_on_not_found(
            v.delete_lines(args[1], start, end, now)
                .map(|n| Reply::Int(n as i64)),
        )
    })
}

// === Navigation ===

fn ls(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    if args.is_empty() || args.len() > 3 {
        return Err(arity("fs.ls"));
    }
    let mut path: &[u8] = b"/";
    let mut long = false;
    let mut have_path = false;
    for &arg in &args[1..] {
        if flag(arg, "LONG") {
            long = true;
        } else if !have_path {
            path = arg;
            have_path = true;
        } else {
            return Err(unknown_option(arg));
        }
    }
    read(ks, args[0], Reply::Nil, |v| {
        nil_on_not_found(if long {
            v.ls_long(path).map(|entries| {
                Reply::Array(
                    entries
                        .into_iter()
                        .map(|e| {
                            Reply::Array(vec![
                                Reply::bulk(e.name),
                                Reply::bulk(e.kind.as_str()),
                                Reply::bulk(format_mode(e.mode)),
                                Reply::Int(e.size as i64),
                                Reply::Int(e.mtime),
                            ])
                        })
                        .collect(),
                )
            })
        } else {
            v.ls(path)
                .map(|names| Reply::Array(names.into_iter().map(Reply::bulk).collect()))
        })
    })
}

fn tree(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    if args.is_empty() || args.len() > 4 {
        return Err(arity("fs.tree"));
    }
    let mut path: &[u8] = b"/";
    let mut have_path = false;
    let mut depth = None;
    let mut i = 1;
    while i < args.len() {
        if flag(args[i], "DEPTH") {
            if i + 1 >= args.len() {
                return Err(arity("fs.tree"));
            }
            let n = parse_i64(args[i + 1])?;
            if n < 0 {
                return Err(FsError::invalid("DEPTH must not be negative"));
            }
            depth = Some(n as usize);
            i += 2;
        } else if !have_path {
            path = args[i];
            have_path = true;
            i += 1;
        } else {
            return Err(unknown_option(args[i]));
        }
    }
    read(ks, args[0], Reply::Nil, |v| {
        nil_on_not_found(v.tree(path, depth).map(|s| Reply::bulk(s.into_bytes())))
    })
}

fn find(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    let filter = match args.len() {
        3 => None,
        5 if flag(args[3], "TYPE") => Some(TypeFilter::parse(args[4])?),
        5 => return Err(unknown_option(args[3])),
        _ => return Err(arity("fs.find")),
    };
    read(ks, args[0], Reply::Nil, |v| {
        nil_on_not_found(
            v.find(args[1], args[2], filter)
                .map(|paths| Reply::Array(paths.into_iter().map(Reply::bulk).collect())),
        )
    })
}

fn stat(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    let (key, path) = two(args, "fs.stat")?;
    read(ks, key, Reply::Nil, |v| {
        nil_on_not_found(v.stat(path).map(|s| {
            Reply::field_map(vec![
                ("type", Reply::bulk(s.kind.as_str())),
                ("mode", Reply::bulk(format_mode(s.mode))),
                ("uid", Reply::Int(s.uid as i64)),
                ("gid", Reply::Int(s.gid as i64)),
                ("size", Reply::Int(s.size as i64)),
                ("ctime", Reply::Int(s.ctime)),
                ("atime", Reply::Int(s.atime)),
                ("mtime", Reply::Int(s.mtime)),
            ])
        }))
    })
}

fn test(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    let (key, path) = two(args, "fs.test")?;
    read(ks, key, Reply::Int(0), |v| {
        v.exists(path).map(|found| Reply::Int(found as i64))
    })
}

fn readlink(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    let (key, path) = two(args, "fs.readlink")?;
    read(ks, key, Reply::Nil, |v| {
        nil_on_not_found(v.readlink(path).map(Reply::Bulk))
    })
}

// === Organization ===

fn mkdir(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    let parents = tail_flag(args, 2, "PARENTS", "fs.mkdir")?;
    mutate(ks, args[0], |v, now| {
        v.mkdir(args[1], parents, now).map(|_| Reply::Ok)
    })
}

fn rm(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    let recursive = tail_flag(args, 2, "RECURSIVE", "fs.rm")?;
    mutate(ks, args[0], |v, now| {
        v.rm(args[1], recursive, now).map(|n| Reply::Int(n as i64))
    })
}

fn cp(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    let recursive = tail_flag(args, 3, "RECURSIVE", "fs.cp")?;
    mutate(ks, args[0], |v, now| {
        v.cp(args[1], args[2], recursive, now).map(|_| Reply::Ok)
    })
}

fn mv(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    if args.len() != 3 {
        return Err(arity("fs.mv"));
    }
    mutate(ks, args[0], |v, now| {
        v.mv(args[1], args[2], now).map(|_| Reply::Ok)
    })
}

fn ln(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    if args.len() != 3 {
        return Err(arity("fs.ln"));
    }
    mutate(ks, args[0], |v, now| {
        v.ln(args[1], args[2], now).map(|_| Reply::Ok)
    })
}

// === Metadata ===

fn chmod(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    if args.len() != 3 {
        return Err(arity("fs.chmod"));
    }
    let mode = parse_mode(args[2])?;
    mutate(ks, args[0], |v, now| {
        v.chmod(args[1], mode, now).map(|_| Reply::Ok)
    })
}

fn chown(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    let (uid, gid) = match args.len() {
        3 => (parse_u32(args[2])?, None),
        4 => (parse_u32(args[2])?, Some(parse_u32(args[3])?)),
        _ => return Err(arity("fs.chown")),
    };
    mutate(ks, args[0], |v, now| {
        v.chown(args[1], uid, gid, now).map(|_| Reply::Ok)
    })
}

fn truncate(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    if args.len() != 3 {
        return Err(arity("fs.truncate"));
    }
    let len = parse_i64(args[2])?;
    if len < 0 {
        return Err(FsError::invalid("length must not be negative"));
    }
    mutate(ks, args[0], |v, now| {
        v.truncate(args[1], len as usize, now).map(|_| Reply::Ok)
    })
}

fn utimens(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    if args.len() != 4 {
        return Err(arity("fs.utimens"));
    }
    let atime = parse_i64(args[2])?;
    let mtime = parse_i64(args[3])?;
    mutate(ks, args[0], |v, now| {
        v.utimens(args[1], atime, mtime, now).map(|_| Reply::Ok)
    })
}

// === Introspection ===

fn info(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    if args.len() != 1 {
        return Err(arity("fs.info"));
    }
    read(ks, args[0], Reply::Array(Vec::new()), |v| {
        let info = v.info();
        Ok(Reply::field_map(vec![
            ("files", Reply::Int(info.files as i64)),
            ("directories", Reply::Int(info.directories as i64)),
            ("symlinks", Reply::Int(info.symlinks as i64)),
            ("total_data_bytes", Reply::Int(info.total_data_bytes as i64)),
            ("total_inodes", Reply::Int(info.total_inodes as i64)),
        ]))
    })
}

fn grep(ks: &mut Keyspace, args: &[&[u8]]) -> Result<Reply> {
    let nocase = match args.len() {
        3 => false,
        4 if flag(args[3], "NOCASE") => true,
        4 => return Err(unknown_option(args[3])),
        _ => return Err(arity("fs.grep")),
    };
    read(ks, args[0], Reply::Nil, |v| {
        nil_on_not_found(v.grep(args[1], args[2], nocase).map(|matches| {
            Reply::Array(
                matches
                    .into_iter()
                    .map(|m| {
                        Reply::Array(vec![
                            Reply::bulk(m.path),
                            Reply::Int(m.line as i64),
                            Reply::Bulk(m.text),
                        ])
                    })
                    .collect(),
            )
        }))
    })
}

// === Shared plumbing ===

fn two<'a>(args: &[&'a [u8]], cmd: &str) -> Result<(&'a [u8], &'a [u8])> {
    if args.len() != 2 {
        return Err(arity(cmd));
    }
    Ok((args[0], args[1]))
}

/// A command whose only option is one trailing flag word.
fn tail_flag(args: &[&[u8]], fixed: usize, word: &str, cmd: &str) -> Result<bool> {
    match args.len() {
        n if n == fixed => Ok(false),
        n if n == fixed + 1 && flag(args[fixed], word) => Ok(true),
        n if n == fixed + 1 => Err(unknown_option(args[fixed])),
        _ => Err(arity(cmd)),
    }
}

fn read(
    ks: &mut Keyspace,
    key: &[u8],
    absent: Reply,
    f: impl FnOnce(&mut Volume) -> Result<Reply>,
) -> Result<Reply> {
    let key = key_of(key)?;
    match ks.volume_mut(&key)? {
        Some(volume) => f(volume),
        None => Ok(absent),
    }
}

fn mutate(
    ks: &mut Keyspace,
    key: &[u8],
    f: impl FnOnce(&mut Volume, i64) -> Result<Reply>,
) -> Result<Reply> {
    let key = key_of(key)?;
    ks.mutate(&key, f)
}

fn nil_on_not_found(result: Result<Reply>) -> Result<Reply> {
    match result {
        Err(FsError::NotFound) => Ok(Reply::Nil),
        other => other,
    }
}

fn key_of(arg: &[u8]) -> Result<String> {
    core::str::from_utf8(arg)
        .map(str::to_string)
        .map_err(|_| FsError::invalid("key is not valid UTF-8"))
}

fn flag(arg: &[u8], word: &str) -> bool {
    arg.eq_ignore_ascii_case(word.as_bytes())
}

fn unknown_option(arg: &[u8]) -> FsError {
    FsError::invalid(format!("unknown option '{}'", String::from_utf8_lossy(arg)))
}

fn arity(cmd: &str) -> FsError {
    FsError::WrongArity(cmd.to_string())
}

fn parse_i64(arg: &[u8]) -> Result<i64> {
    core::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| FsError::invalid("value is not an integer or out of range"))
}

fn parse_u32(arg: &[u8]) -> Result<u32> {
    let value = parse_i64(arg)?;
    if value < 0 || value > i64::from(u32::MAX) {
        return Err(FsError::invalid("value is not an integer or out of range"));
    }
    Ok(value as u32)
}

/// Modes arrive as 1-4 octal digits and render back with a leading zero.
fn parse_mode(arg: &[u8]) -> Result<u16> {
    let s = core::str::from_utf8(arg)
        .map_err(|_| FsError::invalid("mode must be an octal value in [0, 7777]"))?;
    if s.is_empty() || s.len() > 4 || !s.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        return Err(FsError::invalid("mode must be an octal value in [0, 7777]"));
    }
    u16::from_str_radix(s, 8).map_err(|_| FsError::invalid("mode must be an octal value in [0, 7777]"))
}

fn format_mode(mode: u16) -> String {
    format!("0{:o}", mode)
}
