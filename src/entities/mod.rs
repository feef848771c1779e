pub mod city;
pub mod city_log;
pub mod search_result;
