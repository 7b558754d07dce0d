mod market_resolver;
