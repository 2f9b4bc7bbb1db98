// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2020 Tobias Hunger <tobias.hunger@gmail.com>

//! Updating a `SourceFile`

use crate::{Error, Fetch, FetchRequest, FetchType, Key, Prefetcher, Result, SourceFile, Values};

use nus_hash::HashFormat;

// ----------------------------------------------------------------------
// - Prompter:
// ----------------------------------------------------------------------

/// Asks the user for values
pub trait Prompter {
    /// Ask for a new value for `key`, offering `current` as default
    ///
    /// Returning `None` or an empty string keeps the `current` value.
    ///
    /// # Errors
    /// Fails if no answer can be read.
    fn prompt(&mut self, key: &Key, current: Option<&str>) -> Result<Option<String>>;
}

// ----------------------------------------------------------------------
// - UpdateOptions:
// ----------------------------------------------------------------------

/// What to change in a `SourceFile`
#[derive(Clone, Debug)]
pub struct UpdateOptions {
    /// Switch to this fetcher
    pub fetch_type: Option<FetchType>,
    /// Template values to set
    pub set: Vec<(Key, String)>,
    /// Values used during expansion only, never stored
    pub substitute: Vec<(Key, String)>,
    /// Keys to ask the user for
    pub prompt: Vec<Key>,
    /// How to write the hash
    pub hash_format: HashFormat,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            fetch_type: None,
            set: Vec::new(),
            substitute: Vec::new(),
            prompt: Vec::new(),
            hash_format: HashFormat::Base32,
        }
    }
}

// ----------------------------------------------------------------------
// - Helper:
// ----------------------------------------------------------------------

fn check_not_reserved(key: &Key) -> Result<()> {
    if crate::RESERVED_KEYS.contains(&key.as_str()) {
        Err(Error::Config(format!(
            "\"{}\" is reserved and can not be used as a template key.",
            key
        )))
    } else {
        Ok(())
    }
}

fn build_template(
    previous: Option<&SourceFile>,
    options: &UpdateOptions,
    prompter: &mut dyn Prompter,
) -> Result<Values> {
    let mut template = previous.map(|p| p.template.clone()).unwrap_or_default();

    for (k, v) in &options.set {
        check_not_reserved(k)?;
        tracing::debug!("Setting \"{}\" to \"{}\".", k, v);
        template.insert(k.clone(), v.clone());
    }

    for k in &options.prompt {
        check_not_reserved(k)?;
        let current = template.get(k).cloned();
        match prompter.prompt(k, current.as_deref())? {
            Some(answer) if !answer.is_empty() => {
                template.insert(k.clone(), answer);
            }
            _ if current.is_some() => {
                tracing::debug!("Keeping \"{}\".", k);
            }
            _ => return Err(Error::Config(format!("No value given for \"{}\".", k))),
        }
    }

    Ok(template)
}

// ----------------------------------------------------------------------
// - Functions:
// ----------------------------------------------------------------------

/// Prefetch `request` and describe the resulting fetcher call
///
/// The hash is written as `sha256` argument in `format`. A git revision the
/// prefetcher resolved to a different commit replaces the `rev` argument.
///
/// # Errors
/// Fails if prefetching fails.
pub fn fetch(
    request: &FetchRequest,
    prefetcher: &dyn Prefetcher,
    format: HashFormat,
) -> Result<Fetch> {
    let prefetched = prefetcher.prefetch(request)?;
    let mut args = request.json_args();

    if let Some(resolved) = &prefetched.rev {
        if request.args.get("rev") != Some(resolved) {
            tracing::info!(
                "Revision \"{}\" resolved to \"{}\".",
                request.args.get("rev").map_or("", String::as_str),
                resolved
            );
            args.insert("rev".to_string(), serde_json::Value::String(resolved.clone()));
        }
    }
    args.insert(
        "sha256".to_string(),
        serde_json::Value::String(prefetched.hash.format(format)),
    );

    Ok(Fetch {
        function: request.fetch_type,
        args,
    })
}

/// Produce an updated `SourceFile` from `previous` and `options`
///
/// The fetcher comes from `options`, falling back to the one of `previous`.
///
/// # Errors
/// Fails if no fetcher is known, values are missing or invalid, or prefetching fails.
#[tracing::instrument(level = "debug", skip(prompter, prefetcher))]
pub fn update(
    previous: Option<&SourceFile>,
    options: &UpdateOptions,
    prompter: &mut dyn Prompter,
    prefetcher: &dyn Prefetcher,
) -> Result<SourceFile> {
    let fetch_type = options
        .fetch_type
        .or_else(|| previous.and_then(|p| p.fetch_type))
        .ok_or_else(|| {
            Error::Config("No fetcher type is known for this source, please pass one.".to_string())
        })?;

    let template = build_template(previous, options, prompter)?;
    let substitutions = options.substitute.iter().cloned().collect::<Values>();

    let values = crate::template::expand(&template, &substitutions)?;
    let request = FetchRequest::new(fetch_type, &values)?;
    let fetch = self::fetch(&request, prefetcher, options.hash_format)?;

    if let Some(old) = previous.and_then(|p| p.fetch.as_ref()) {
        if *old == fetch {
            tracing::info!("Source is unchanged.");
        }
    }

    Ok(SourceFile {
        fetch: Some(fetch),
        fetch_type: Some(fetch_type),
        template,
        values,
    })
}

// ----------------------------------------------------------------------
// - Tests:
// ----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    use nus_hash::{Algorithm, Hash, HashFormat};

    use crate::{FetchRequest, FetchType, Key, Prefetched, Prefetcher, Result, SourceFile};

    use super::{Prompter, UpdateOptions};

    struct FakePrefetcher {
        rev: Option<String>,
        seen: RefCell<Vec<FetchRequest>>,
    }

    impl FakePrefetcher {
        fn new(rev: Option<&str>) -> Self {
            Self {
                rev: rev.map(str::to_string),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Prefetcher for FakePrefetcher {
        fn prefetch(&self, request: &FetchRequest) -> Result<Prefetched> {
            self.seen.borrow_mut().push(request.clone());
            Ok(Prefetched {
                hash: Hash::calculate(Algorithm::Sha256, b"abc"),
                rev: self.rev.clone(),
                store_path: None,
            })
        }
    }

    struct FakePrompter {
        answers: BTreeMap<String, String>,
        asked: Vec<(String, Option<String>)>,
    }

    impl FakePrompter {
        fn new(answers: &[(&str, &str)]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
                asked: Vec::new(),
            }
        }
    }

    impl Prompter for FakePrompter {
        fn prompt(&mut self, key: &Key, current: Option<&str>) -> Result<Option<String>> {
            self.asked
                .push((key.to_string(), current.map(str::to_string)));
            Ok(self.answers.get(key.as_str()).cloned())
        }
    }

    fn key(k: &str) -> Key {
        Key::new(k).unwrap()
    }

    fn github_options() -> UpdateOptions {
        UpdateOptions {
            fetch_type: Some(FetchType::FetchFromGitHub),
            set: vec![
                (key("owner"), "timbertson".to_string()),
                (key("repo"), "gup".to_string()),
                (key("rev"), "version-{version}".to_string()),
            ],
            prompt: vec![key("version")],
            ..UpdateOptions::default()
        }
    }

    #[test]
    fn update_from_scratch() {
        let prefetcher = FakePrefetcher::new(None);
        let mut prompter = FakePrompter::new(&[("version", "0.5.5")]);

        let result =
            super::update(None, &github_options(), &mut prompter, &prefetcher).unwrap();

        assert_eq!(prompter.asked, vec![("version".to_string(), None)]);
        assert_eq!(result.fetch_type, Some(FetchType::FetchFromGitHub));
        assert_eq!(result.template["rev"], "version-{version}");
        assert_eq!(result.values["rev"], "version-0.5.5");

        let fetch = result.fetch.unwrap();
        assert_eq!(fetch.function, FetchType::FetchFromGitHub);
        assert_eq!(fetch.arg("rev"), Some("version-0.5.5"));
        assert_eq!(
            fetch.arg("sha256"),
            Some("1b8m03r63zqhnjf7l5wnldhh7c134ap5vpj0850ymkq1iyzicy5s")
        );
        assert!(fetch.arg("version").is_none());

        let seen = prefetcher.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].args["owner"], "timbertson");
    }

    #[test]
    fn update_reuses_previous_template() {
        let prefetcher = FakePrefetcher::new(None);
        let mut prompter = FakePrompter::new(&[("version", "0.5.5")]);
        let previous =
            super::update(None, &github_options(), &mut prompter, &prefetcher).unwrap();

        let mut prompter = FakePrompter::new(&[("version", "0.6.0")]);
        let options = UpdateOptions {
            prompt: vec![key("version")],
            hash_format: HashFormat::Sri,
            ..UpdateOptions::default()
        };
        let result = super::update(Some(&previous), &options, &mut prompter, &prefetcher).unwrap();

        assert_eq!(
            prompter.asked,
            vec![("version".to_string(), Some("0.5.5".to_string()))]
        );
        assert_eq!(result.values["rev"], "version-0.6.0");
        assert_eq!(
            result.fetch.unwrap().arg("sha256"),
            Some("sha256-ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0=")
        );
    }

    #[test]
    fn update_keeps_value_on_empty_answer() {
        let prefetcher = FakePrefetcher::new(None);
        let mut prompter = FakePrompter::new(&[("version", "0.5.5")]);
        let previous =
            super::update(None, &github_options(), &mut prompter, &prefetcher).unwrap();

        let mut prompter = FakePrompter::new(&[("version", "")]);
        let options = UpdateOptions {
            prompt: vec![key("version")],
            ..UpdateOptions::default()
        };
        let result = super::update(Some(&previous), &options, &mut prompter, &prefetcher).unwrap();
        assert_eq!(result.values["version"], "0.5.5");
    }

    #[test]
    fn update_git_records_resolved_revision() {
        let prefetcher = FakePrefetcher::new(Some("0123456789abcdef"));
        let mut prompter = FakePrompter::new(&[]);
        let options = UpdateOptions {
            fetch_type: Some(FetchType::FetchGit),
            set: vec![
                (key("url"), "https://example.com/repo.git".to_string()),
                (key("rev"), "master".to_string()),
                (key("fetchSubmodules"), "true".to_string()),
            ],
            ..UpdateOptions::default()
        };

        let result = super::update(None, &options, &mut prompter, &prefetcher).unwrap();
        let fetch = result.fetch.unwrap();
        assert_eq!(fetch.arg("rev"), Some("0123456789abcdef"));
        assert_eq!(fetch.args["fetchSubmodules"], serde_json::Value::Bool(true));
        assert_eq!(result.values["rev"], "master");
    }

    #[test]
    fn update_substitutions_are_not_stored() {
        let prefetcher = FakePrefetcher::new(None);
        let mut prompter = FakePrompter::new(&[]);
        let options = UpdateOptions {
            fetch_type: Some(FetchType::FetchUrl),
            set: vec![(
                key("url"),
                "https://example.com/{name}-{version}.tar.gz".to_string(),
            )],
            substitute: vec![
                (key("name"), "foo".to_string()),
                (key("version"), "1.0".to_string()),
            ],
            ..UpdateOptions::default()
        };

        let result = super::update(None, &options, &mut prompter, &prefetcher).unwrap();
        assert_eq!(result.values.len(), 1);
        assert_eq!(result.values["url"], "https://example.com/foo-1.0.tar.gz");
        assert!(!result.template.contains_key("name"));
    }

    #[test]
    fn update_errors() {
        let prefetcher = FakePrefetcher::new(None);

        let mut prompter = FakePrompter::new(&[]);
        let no_type = UpdateOptions::default();
        assert!(super::update(None, &no_type, &mut prompter, &prefetcher).is_err());

        let mut prompter = FakePrompter::new(&[]);
        assert!(super::update(None, &github_options(), &mut prompter, &prefetcher).is_err());

        let mut prompter = FakePrompter::new(&[]);
        let reserved = UpdateOptions {
            fetch_type: Some(FetchType::FetchUrl),
            set: vec![(key("type"), "x".to_string())],
            ..UpdateOptions::default()
        };
        assert!(super::update(None, &reserved, &mut prompter, &prefetcher).is_err());

        assert!(prefetcher.seen.borrow().is_empty());
    }

    #[test]
    fn update_switches_type() {
        let prefetcher = FakePrefetcher::new(None);
        let mut prompter = FakePrompter::new(&[("version", "0.5.5")]);
        let previous: SourceFile =
            super::update(None, &github_options(), &mut prompter, &prefetcher).unwrap();

        let options = UpdateOptions {
            fetch_type: Some(FetchType::FetchZip),
            set: vec![(
                key("url"),
                "https://github.com/{owner}/{repo}/archive/{rev}.zip".to_string(),
            )],
            ..UpdateOptions::default()
        };
        let result = super::update(Some(&previous), &options, &mut prompter, &prefetcher).unwrap();
        let fetch = result.fetch.unwrap();
        assert_eq!(fetch.function, FetchType::FetchZip);
        assert_eq!(
            fetch.arg("url"),
            Some("https://github.com/timbertson/gup/archive/version-0.5.5.zip")
        );
        assert!(fetch.arg("owner").is_none());
    }
}
