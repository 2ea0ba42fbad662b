use std::sync::Arc;

use crate::core::{
    domain::{Language, UnsupportedLanguage},
    traits::tester::LanguageTester,
};

/// One tester per supported [`Language`].
#[derive(Clone, Debug)]
pub struct Testers {
    cpp: Arc<dyn LanguageTester>,
}

impl Testers {
    pub fn new(cpp: Arc<dyn LanguageTester>) -> Self {
        Testers { cpp }
    }

    pub fn get(&self, language: Language) -> Arc<dyn LanguageTester> {
        match language {
            Language::Cpp => self.cpp.clone(),
        }
    }

    pub fn resolve(&self, tag: &str) -> Result<Arc<dyn LanguageTester>, UnsupportedLanguage> {
        Ok(self.get(tag.parse()?))
    }
}
